use std::sync::Arc;

use aide::openapi::{Info, OpenApi};
use axum::{Extension, Router};
use datadog_tracing::axum::{shutdown_signal, OtelAxumLayer, OtelInResponseLayer};
use sensor_storage::SensorReadings;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::routes::{self, DashboardDefaults};
use crate::{image_index::ImageIndex, image_link::ImageLinkIssuer, types::Environment};

/// Long-lived services shared by every request
#[derive(Clone)]
pub struct Services {
    /// Nearest-snapshot lookup
    pub image_index: Arc<ImageIndex>,
    /// Presigned URL issuance
    pub image_link_issuer: Arc<ImageLinkIssuer>,
    /// Sensor time series
    pub sensor_readings: Arc<dyn SensorReadings>,
    /// Dashboard selection defaults
    pub dashboard_defaults: DashboardDefaults,
}

/// Builds the application router with all layers and shared services
#[must_use]
pub fn router(environment: Environment, services: Services) -> Router {
    let mut openapi = OpenApi {
        info: Info {
            title: "Plant Monitor API".to_string(),
            description: Some("Backend API of the plant monitoring dashboard".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Info::default()
        },
        ..OpenApi::default()
    };

    routes::handler()
        .finish_api(&mut openapi)
        .layer(Extension(openapi))
        .layer(Extension(environment))
        .layer(Extension(services.image_index))
        .layer(Extension(services.image_link_issuer))
        .layer(Extension(services.sensor_readings))
        .layer(Extension(services.dashboard_defaults))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        // Include trace context as header into the response
        .layer(OtelInResponseLayer)
        // Start OpenTelemetry trace on incoming request
        .layer(OtelAxumLayer::default())
        .layer(tower_http::timeout::TimeoutLayer::new(
            std::time::Duration::from_secs(5),
        ))
}

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(environment: Environment, services: Services) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], environment.port()?));
    let router = router(environment, services);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 Plant Monitor started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}
