use crate::error::LoadError;
use crate::types::{RawRow, REQUIRED_COLUMNS};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use serde_json::{Map, Value as JsonValue};
use shapefile::dbase::FieldValue;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use tracing::{debug, info};

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::FileNotFound(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Reads the stakeholder CSV into string-keyed rows.
///
/// Every required column must be present in the header. Short rows are
/// accepted and their missing cells read as empty strings.
pub fn load_stakeholder_rows(path: &Path) -> Result<Vec<RawRow>, LoadError> {
    let file = open(path)?;
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = rdr
        .headers()
        .map_err(|e| LoadError::parse(path, e))?
        .clone();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h.trim() == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        });
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| LoadError::parse(path, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let fields: HashMap<String, String> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(RawRow { line, fields });
    }

    info!("Loaded {} stakeholder rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Loads a boundary document as a GeoJSON feature collection.
///
/// `.geojson`/`.json` files must hold a FeatureCollection; `.shp` files are
/// read with their `.dbf` attributes and converted feature by feature.
pub fn load_boundaries(path: &Path) -> Result<FeatureCollection, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .ok_or_else(|| LoadError::parse(path, "boundary file has no extension"))?;

    let collection = match extension.as_str() {
        "json" | "geojson" => load_geojson(path)?,
        "shp" => load_shapefile(path)?,
        _ => {
            return Err(LoadError::parse(
                path,
                format!("unsupported boundary format: {}", extension),
            ))
        }
    };

    info!(
        "Loaded {} boundary features from {:?}",
        collection.features.len(),
        path
    );
    Ok(collection)
}

fn load_geojson(path: &Path) -> Result<FeatureCollection, LoadError> {
    let reader = BufReader::new(open(path)?);
    let geojson = GeoJson::from_reader(reader).map_err(|e| LoadError::parse(path, e))?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => Err(LoadError::parse(path, "GeoJSON must be a FeatureCollection")),
    }
}

fn load_shapefile(path: &Path) -> Result<FeatureCollection, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound(path.to_path_buf()));
    }
    let mut reader =
        shapefile::Reader::from_path(path).map_err(|e| LoadError::parse(path, e))?;

    let mut features = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.map_err(|e| LoadError::parse(path, e))?;

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon
                .try_into()
                .map_err(|e| LoadError::parse(path, format!("bad polygon: {:?}", e)))?,
            shapefile::Shape::PolygonM(polygon) => polygon
                .try_into()
                .map_err(|e| LoadError::parse(path, format!("bad polygonM: {:?}", e)))?,
            shapefile::Shape::PolygonZ(polygon) => polygon
                .try_into()
                .map_err(|e| LoadError::parse(path, format!("bad polygonZ: {:?}", e)))?,
            other => {
                debug!("Skipping non-polygon shape {:?}", other.shapetype());
                continue;
            }
        };

        let properties: Map<String, JsonValue> = record
            .into_iter()
            .map(|(name, value)| (name, field_to_json(value)))
            .collect();

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::from(&geometry))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// dbase attribute -> JSON. Dates become `YYYY-MM-DD` strings.
fn field_to_json(value: FieldValue) -> JsonValue {
    match value {
        FieldValue::Character(Some(s)) => JsonValue::String(s.trim().to_string()),
        FieldValue::Memo(s) => JsonValue::String(s),
        FieldValue::Numeric(Some(n)) => number(n),
        FieldValue::Float(Some(n)) => number(n as f64),
        FieldValue::Double(n) | FieldValue::Currency(n) => number(n),
        FieldValue::Integer(n) => JsonValue::from(n),
        FieldValue::Logical(Some(b)) => JsonValue::Bool(b),
        FieldValue::Date(Some(d)) => {
            JsonValue::String(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
        }
        FieldValue::Character(None)
        | FieldValue::Numeric(None)
        | FieldValue::Float(None)
        | FieldValue::Logical(None)
        | FieldValue::Date(None) => JsonValue::Null,
        other => JsonValue::String(format!("{:?}", other)),
    }
}

fn number(n: f64) -> JsonValue {
    serde_json::Number::from_f64(n)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}
