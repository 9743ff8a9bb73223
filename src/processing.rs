use crate::types::*;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoordinateField {
    Latitude,
    Longitude,
}

impl fmt::Display for CoordinateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateField::Latitude => f.write_str(COL_LATITUDE),
            CoordinateField::Longitude => f.write_str(COL_LONGITUDE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DropReason {
    Missing(CoordinateField),
    NotNumeric(CoordinateField, String),
    NotFinite(CoordinateField),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Missing(field) => write!(f, "{} is empty", field),
            DropReason::NotNumeric(field, raw) => write!(f, "{} '{}' is not a number", field, raw),
            DropReason::NotFinite(field) => write!(f, "{} is not finite", field),
        }
    }
}

/// A row excluded from rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRow {
    pub line: u64,
    pub company_name: String,
    pub reason: DropReason,
}

#[derive(Debug, Clone, Default)]
pub struct Cleaned {
    pub records: Vec<StakeholderRecord>,
    pub dropped: Vec<DroppedRow>,
}

impl Cleaned {
    pub fn total_rows(&self) -> usize {
        self.records.len() + self.dropped.len()
    }
}

/// Keeps rows whose latitude and longitude both parse as finite numbers,
/// in input order. Nothing is repaired; other fields pass through as-is.
pub fn clean_rows(rows: Vec<RawRow>) -> Cleaned {
    let mut cleaned = Cleaned::default();

    for row in rows {
        let coords = parse_coordinate(&row, CoordinateField::Latitude).and_then(|lat| {
            parse_coordinate(&row, CoordinateField::Longitude).map(|lon| (lat, lon))
        });

        match coords {
            Ok((latitude, longitude)) => cleaned.records.push(StakeholderRecord {
                company_name: row.get(COL_COMPANY).to_string(),
                category: row.get(COL_CATEGORY).to_string(),
                commodity: row.get(COL_COMMODITY).to_string(),
                office_address: row.get(COL_ADDRESS).to_string(),
                contact_person: row.get(COL_CONTACT_PERSON).to_string(),
                phone: row.get(COL_PHONE).to_string(),
                designation: row.get(COL_DESIGNATION).to_string(),
                contact: row.get(COL_CONTACT).to_string(),
                latitude,
                longitude,
            }),
            Err(reason) => {
                debug!("Dropping row {}: {}", row.line, reason);
                cleaned.dropped.push(DroppedRow {
                    line: row.line,
                    company_name: row.get(COL_COMPANY).to_string(),
                    reason,
                });
            }
        }
    }

    info!(
        "Cleaned {} rows: {} valid, {} dropped",
        cleaned.total_rows(),
        cleaned.records.len(),
        cleaned.dropped.len()
    );
    cleaned
}

fn parse_coordinate(row: &RawRow, field: CoordinateField) -> Result<f64, DropReason> {
    let column = match field {
        CoordinateField::Latitude => COL_LATITUDE,
        CoordinateField::Longitude => COL_LONGITUDE,
    };
    let raw = row.get(column).trim();
    if raw.is_empty() {
        return Err(DropReason::Missing(field));
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| DropReason::NotNumeric(field, raw.to_string()))?;
    if !value.is_finite() {
        return Err(DropReason::NotFinite(field));
    }
    Ok(value)
}
