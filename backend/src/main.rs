use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use plant_monitor::{
    image_index::ImageIndex,
    image_link::ImageLinkIssuer,
    object_store::{ObjectStore, S3ObjectStore},
    routes::DashboardDefaults,
    server::{self, Services},
    types::Environment,
};
use sensor_storage::{SensorReadingStorage, SensorReadings};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env()?;

    // Configure logging format based on environment
    // Use JSON format for staging/production (Datadog), regular format for development
    if environment.json_logs() {
        fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        fmt().with_env_filter(EnvFilter::from_default_env()).init();
    }

    // Missing bucket configuration is fatal before any traffic is served
    let bucket_name = environment.s3_bucket()?;
    let timestamp_policy = environment.timestamp_policy()?;
    let dashboard_defaults = DashboardDefaults {
        data_type: environment.default_data_type(),
        period_days: environment.default_period_days()?,
    };

    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let dynamodb_client = Arc::new(DynamoDbClient::new(&environment.aws_config().await));

    let object_store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(s3_client, bucket_name));
    let image_index = Arc::new(ImageIndex::new(
        object_store.clone(),
        environment.image_prefix(),
        timestamp_policy,
    ));
    let image_link_issuer = Arc::new(ImageLinkIssuer::new(
        object_store,
        environment.presigned_url_expiry_secs(),
    ));
    let sensor_readings: Arc<dyn SensorReadings> = Arc::new(SensorReadingStorage::new(
        dynamodb_client,
        environment.readings_table(),
    ));

    tracing::info!(
        bucket = image_index.bucket(),
        prefix = %environment.image_prefix(),
        policy = %timestamp_policy,
        table = %environment.readings_table(),
        "configuration loaded"
    );

    server::start(
        environment,
        Services {
            image_index,
            image_link_issuer,
            sensor_readings,
            dashboard_defaults,
        },
    )
    .await
}
