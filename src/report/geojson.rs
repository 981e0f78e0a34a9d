//! GeoJSON export of classified map points.

use crate::analysis::GeoClassification;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::path::Path;

/// Build a FeatureCollection with one Point feature per map point.
///
/// Coordinates follow GeoJSON order: `[longitude, latitude]`.
pub fn generate_geojson(map: &GeoClassification) -> Value {
    let features: Vec<Value> = map
        .points
        .iter()
        .map(|point| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [point.longitude, point.latitude],
                },
                "properties": {
                    "crime_type": point.crime_type,
                    "date_occ": point.occurred_date,
                    "vict_age": point.victim_age,
                    "vict_sex": point.victim_sex,
                    "area": point.area,
                    "marker-color": point.color,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
        "legend": map.legend,
    })
}

/// Write the GeoJSON layer to a file.
pub fn write_geojson(map: &GeoClassification, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(&generate_geojson(map))
        .context("Failed to serialize GeoJSON")?;

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write GeoJSON to {}", path.display()))
}
