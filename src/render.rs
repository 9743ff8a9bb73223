use crate::config::AppConfig;
use crate::templates::PopupTemplate;
use crate::types::{BoundaryLayer, StakeholderRecord};
use askama::Template;
use geo::{Centroid, MultiPoint, Point};
use geojson::FeatureCollection;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

pub const STAKEHOLDER_LAYER: &str = "Stakeholders";
pub const DENSITY_LAYER: &str = "Density";
pub const ROUTE_LAYER: &str = "Route";
const UNCATEGORISED: &str = "Uncategorised";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapView {
    /// [lat, lon]
    pub center: [f64; 2],
    pub zoom: u8,
    pub search_zoom: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct TileLayer {
    pub url: String,
    pub attribution: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Marker {
    pub name: String,
    pub category: String,
    pub lat: f64,
    pub lng: f64,
    pub icon: String,
    pub popup: String,
}

/// A toggleable group of markers, referenced by index into `MapDocument::markers`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarkerLayer {
    pub name: String,
    pub cluster: bool,
    pub members: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatLayer {
    pub name: String,
    /// [lat, lon, weight]; identical coordinates are merged.
    pub points: Vec<[f64; 3]>,
    pub radius: u32,
    pub blur: u32,
    pub gradient: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundaryOverlay {
    pub name: String,
    pub color: String,
    pub weight: f64,
    pub label_property: Option<String>,
    pub data: FeatureCollection,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteOverlay {
    pub name: String,
    /// [lat, lon]
    pub points: Vec<[f64; 2]>,
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
}

/// Everything the page needs to draw the map.
#[derive(Debug, Clone, Serialize)]
pub struct MapDocument {
    pub view: MapView,
    pub tiles: TileLayer,
    pub icon_size: u32,
    pub mouse_position: bool,
    pub markers: Vec<Marker>,
    pub marker_layers: Vec<MarkerLayer>,
    pub heat: Option<HeatLayer>,
    pub boundaries: Vec<BoundaryOverlay>,
    pub route: Option<RouteOverlay>,
}

impl MapDocument {
    /// Overlay names in the order the layer control lists them.
    pub fn overlay_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.marker_layers.iter().map(|l| l.name.clone()).collect();
        if let Some(heat) = &self.heat {
            names.push(heat.name.clone());
        }
        names.extend(self.boundaries.iter().map(|b| b.name.clone()));
        if let Some(route) = &self.route {
            names.push(route.name.clone());
        }
        names
    }

    pub fn uses_clustering(&self) -> bool {
        self.marker_layers.iter().any(|l| l.cluster)
    }

    pub fn with_route(mut self, points: Vec<[f64; 2]>) -> Self {
        self.route = Some(RouteOverlay {
            name: ROUTE_LAYER.to_string(),
            points,
            color: "blue".to_string(),
            weight: 5.0,
            opacity: 0.7,
        });
        self
    }
}

/// Composes the map from cleaned records and whichever boundary sets loaded.
pub fn render_map(
    config: &AppConfig,
    records: &[StakeholderRecord],
    boundaries: Vec<BoundaryLayer>,
) -> askama::Result<MapDocument> {
    let center = map_center(records).unwrap_or(config.map.fallback_center);

    let markers: Vec<Marker> = records
        .iter()
        .map(|r| {
            Ok(Marker {
                name: r.company_name.clone(),
                category: r.category.clone(),
                lat: r.latitude,
                lng: r.longitude,
                icon: config.icons.icon_for(&r.category).to_string(),
                popup: popup_html(r)?,
            })
        })
        .collect::<askama::Result<_>>()?;

    let marker_layers = group_markers(&markers, config.render.category_layers, config.render.cluster);

    let heat = config.heatmap.enabled.then(|| HeatLayer {
        name: DENSITY_LAYER.to_string(),
        points: density_points(records),
        radius: config.heatmap.radius,
        blur: config.heatmap.blur,
        gradient: config.heatmap.gradient.clone(),
    });

    let boundaries: Vec<BoundaryOverlay> = boundaries
        .into_iter()
        .map(|b| BoundaryOverlay {
            name: b.name,
            color: b.color,
            weight: b.weight,
            label_property: b.label_property,
            data: b.features,
        })
        .collect();

    info!(
        "Rendered {} markers in {} layer(s), {} boundary overlay(s), density layer: {}",
        markers.len(),
        marker_layers.len(),
        boundaries.len(),
        heat.is_some()
    );

    Ok(MapDocument {
        view: MapView {
            center,
            zoom: config.map.zoom_start,
            search_zoom: config.map.search_zoom,
        },
        tiles: TileLayer {
            url: config.map.tiles.clone(),
            attribution: config.map.attribution.clone(),
        },
        icon_size: config.icons.size,
        mouse_position: config.map.mouse_position,
        markers,
        marker_layers,
        heat,
        boundaries,
        route: None,
    })
}

/// Mean latitude and longitude of the records, or `None` when empty.
pub fn map_center(records: &[StakeholderRecord]) -> Option<[f64; 2]> {
    let points: MultiPoint<f64> = records.iter().map(StakeholderRecord::point).collect();
    points.centroid().map(|c: Point<f64>| [c.y(), c.x()])
}

fn group_markers(markers: &[Marker], by_category: bool, cluster: bool) -> Vec<MarkerLayer> {
    if !by_category {
        return vec![MarkerLayer {
            name: STAKEHOLDER_LAYER.to_string(),
            cluster,
            members: (0..markers.len()).collect(),
        }];
    }

    let mut layers: Vec<MarkerLayer> = Vec::new();
    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for (i, marker) in markers.iter().enumerate() {
        let name = match marker.category.trim() {
            "" => UNCATEGORISED,
            category => category,
        };
        let slot = *by_name.entry(name).or_insert_with(|| {
            layers.push(MarkerLayer {
                name: name.to_string(),
                cluster,
                members: Vec::new(),
            });
            layers.len() - 1
        });
        layers[slot].members.push(i);
    }
    layers
}

/// Weighted density points, first-seen order.
fn density_points(records: &[StakeholderRecord]) -> Vec<[f64; 3]> {
    let mut points: Vec<[f64; 3]> = Vec::new();
    let mut seen: HashMap<(u64, u64), usize> = HashMap::new();
    for r in records {
        let key = (r.latitude.to_bits(), r.longitude.to_bits());
        match seen.get(&key) {
            Some(&i) => points[i][2] += 1.0,
            None => {
                seen.insert(key, points.len());
                points.push([r.latitude, r.longitude, 1.0]);
            }
        }
    }
    points
}

/// Popup body shared by the marker and the search result.
pub fn popup_html(record: &StakeholderRecord) -> askama::Result<String> {
    PopupTemplate::for_record(record).render()
}
