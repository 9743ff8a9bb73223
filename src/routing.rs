use crate::config::RoutingConfig;
use crate::error::RouteError;
use crate::types::StakeholderRecord;
use geojson::{GeoJson, Value};
use serde_json::json;
use std::time::Duration;
use tracing::info;

/// Driving path between the first two records, as [lat, lon] points.
pub async fn route_between_first_two(
    config: &RoutingConfig,
    records: &[StakeholderRecord],
) -> Result<Vec<[f64; 2]>, RouteError> {
    let (from, to) = match records {
        [from, to, ..] => (from, to),
        _ => return Err(RouteError::NotEnoughStops(records.len())),
    };
    let api_key = config.resolve_api_key().ok_or(RouteError::MissingApiKey)?;

    let url = format!(
        "{}/{}/geojson",
        config.endpoint.trim_end_matches('/'),
        config.profile
    );
    info!(
        "Requesting {} route from '{}' to '{}'",
        config.profile, from.company_name, to.company_name
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let response = client
        .post(&url)
        .header("Authorization", api_key)
        .json(&json!({
            "coordinates": [
                [from.longitude, from.latitude],
                [to.longitude, to.latitude],
            ]
        }))
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(RouteError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let points = parse_route(&body)?;
    info!("Route has {} points", points.len());
    Ok(points)
}

/// Pulls the first LineString out of a directions GeoJSON response and flips
/// it to [lat, lon] for drawing.
pub fn parse_route(body: &str) -> Result<Vec<[f64; 2]>, RouteError> {
    let geojson: GeoJson = body
        .parse()
        .map_err(|e: geojson::Error| RouteError::BadResponse(e.to_string()))?;

    let geometry = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.into_iter().find_map(|f| f.geometry),
        GeoJson::Feature(f) => f.geometry,
        GeoJson::Geometry(g) => Some(g),
    }
    .ok_or_else(|| RouteError::BadResponse("response has no geometry".to_string()))?;

    match geometry.value {
        Value::LineString(coords) => Ok(coords
            .into_iter()
            .filter(|c| c.len() >= 2)
            .map(|c| [c[1], c[0]])
            .collect()),
        _ => Err(RouteError::BadResponse(
            "route geometry is not a LineString".to_string(),
        )),
    }
}
