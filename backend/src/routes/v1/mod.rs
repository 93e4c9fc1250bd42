pub mod data;
pub mod health;
pub mod plants;

use aide::axum::{routing::get, ApiRouter};

/// Creates the v1 API router with all v1 handler routes
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .api_route("/data", get(data::get_sensor_data))
        .api_route("/data/latest", get(data::get_latest_data))
        .api_route("/data/summary", get(data::get_data_summary))
        .api_route("/plants", get(plants::get_plants))
        .api_route("/health", get(health::handler))
}
