mod dashboard;
mod docs;
mod health;
pub mod images;
pub mod v1;

use aide::axum::{routing::get, ApiRouter};

pub use dashboard::DashboardDefaults;

/// Creates the router with all handler routes
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .merge(docs::handler())
        .route("/", axum::routing::get(dashboard::handler))
        .api_route("/health", get(health::handler))
        .api_route("/image-for-timestamp", get(images::image_for_timestamp))
        // Path used by the first dashboard release
        .api_route("/get_image_for_timestamp", get(images::image_for_timestamp))
        .nest("/api/v1", v1::handler())
}
