use axum::Json;
use chrono::Utc;
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
pub struct HealthStatus {
    status: &'static str,
    /// Server time, RFC 3339
    timestamp: String,
    /// Sensor store wiring
    dynamodb: &'static str,
}

/// Liveness probe used by the dashboard client
pub async fn handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        dynamodb: "connected",
    })
}
