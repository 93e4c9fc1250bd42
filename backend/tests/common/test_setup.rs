use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use plant_monitor::{
    image_index::{ImageIndex, TimestampPolicy},
    image_link::{ImageLinkIssuer, DEFAULT_EXPIRY_SECS},
    object_store::mock::MockObjectStore,
    routes::DashboardDefaults,
    server::{self, Services},
    types::Environment,
};
use sensor_storage::readings::mock::MockSensorReadings;
use tower::ServiceExt;

/// Setup test logging
pub fn setup_test_env() {
    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Router wired to in-memory stores
pub struct TestSetup {
    pub router: Router,
    pub object_store: Arc<MockObjectStore>,
}

impl TestSetup {
    pub fn new(
        object_store: MockObjectStore,
        policy: TimestampPolicy,
        sensor_readings: MockSensorReadings,
    ) -> Self {
        setup_test_env();

        let environment = Environment::Development {
            presign_expiry_override: None,
        };

        let object_store = Arc::new(object_store);
        let image_index = Arc::new(ImageIndex::new(
            object_store.clone(),
            "plant_images/".to_string(),
            policy,
        ));
        let image_link_issuer = Arc::new(ImageLinkIssuer::new(
            object_store.clone(),
            DEFAULT_EXPIRY_SECS,
        ));

        let router = server::router(
            environment,
            Services {
                image_index,
                image_link_issuer,
                sensor_readings: Arc::new(sensor_readings),
                dashboard_defaults: DashboardDefaults {
                    data_type: "temperature".to_string(),
                    period_days: 7,
                },
            },
        );

        Self {
            router,
            object_store,
        }
    }

    /// Snapshots named by capture time, no sensor data
    pub fn with_images(object_store: MockObjectStore) -> Self {
        Self::new(
            object_store,
            TimestampPolicy::KeyPattern,
            MockSensorReadings::new(Vec::new()),
        )
    }

    /// Sensor data only, empty bucket
    pub fn with_readings(sensor_readings: MockSensorReadings) -> Self {
        Self::new(
            MockObjectStore::new(Vec::new()),
            TimestampPolicy::KeyPattern,
            sensor_readings,
        )
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}
