use axum::Json;
use chrono::Utc;
use schemars::JsonSchema;
use serde::Serialize;

use super::data::{DEVICE_ID, LOCATION};

#[derive(Debug, Serialize, JsonSchema)]
pub struct Range {
    min: f64,
    max: f64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Thresholds {
    temperature: Range,
    ph: Range,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Plant {
    id: &'static str,
    name: &'static str,
    species: &'static str,
    location: &'static str,
    device_id: &'static str,
    created_at: &'static str,
    updated_at: String,
    /// Healthy ranges per series
    thresholds: Thresholds,
}

/// Lists the monitored plants
///
/// There is a single plant per greenhouse today, so the catalogue is static.
pub async fn get_plants() -> Json<Vec<Plant>> {
    Json(vec![Plant {
        id: "plant-001",
        name: "Basil",
        species: "Ocimum basilicum",
        location: LOCATION,
        device_id: DEVICE_ID,
        created_at: "2025-01-01T00:00:00Z",
        updated_at: Utc::now().to_rfc3339(),
        thresholds: Thresholds {
            temperature: Range {
                min: 18.0,
                max: 28.0,
            },
            ph: Range { min: 6.0, max: 7.5 },
        },
    }])
}
