//! Environment configuration for different deployment stages

use std::env;
use std::str::FromStr;
use std::time::Duration;

use aws_config::{
    meta::region::RegionProviderChain, retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion,
};
use thiserror::Error;

use crate::image_index::TimestampPolicy;
use crate::image_link::DEFAULT_EXPIRY_SECS;

/// Region used when none is configured
const DEFAULT_AWS_REGION: &str = "ap-northeast-1";

/// Errors raised while reading configuration at start-up
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A mandatory variable is unset or blank
    #[error("{0} environment variable is not set")]
    Missing(&'static str),

    /// A variable is set to something that cannot be used
    #[error("Invalid value for {name}: {value}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },
}

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Optional override for presigned URL expiry in seconds
        presign_expiry_override: Option<u64>,
    },
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            let parsed = value.trim().parse();
            parsed.map_err(|_| ConfigError::Invalid { name, value })
        }
        _ => Ok(default),
    }
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `APP_ENV` names an unknown environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = var_or("APP_ENV", "development").to_lowercase();

        match env.as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => {
                // Check for presigned URL expiry override
                let presign_expiry_override = env::var("PRESIGNED_URL_EXPIRY_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok())
                    .filter(|secs| *secs > 0);

                Ok(Self::Development {
                    presign_expiry_override,
                })
            }
            _ => Err(ConfigError::Invalid {
                name: "APP_ENV",
                value: env,
            }),
        }
    }

    /// Returns the S3 bucket holding the camera snapshots
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `S3_BUCKET_NAME` is unset or blank, in every
    /// environment
    pub fn s3_bucket(&self) -> Result<String, ConfigError> {
        env::var("S3_BUCKET_NAME")
            .ok()
            .map(|bucket| bucket.trim().to_string())
            .filter(|bucket| !bucket.is_empty())
            .ok_or(ConfigError::Missing("S3_BUCKET_NAME"))
    }

    /// Key prefix under which snapshots are stored
    #[must_use]
    pub fn image_prefix(&self) -> String {
        var_or("S3_IMAGE_PREFIX", "plant_images/")
    }

    /// How snapshot capture times are determined
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for anything but `key_pattern` or `last_modified`
    pub fn timestamp_policy(&self) -> Result<TimestampPolicy, ConfigError> {
        parse_var("IMAGE_TIMESTAMP_POLICY", TimestampPolicy::KeyPattern)
    }

    /// Dynamo DB table holding aggregated sensor readings
    #[must_use]
    pub fn readings_table(&self) -> String {
        var_or("DYNAMODB_TABLE_NAME", "aggdata_table")
    }

    /// Series shown on the dashboard when none is requested
    #[must_use]
    pub fn default_data_type(&self) -> String {
        var_or("DEFAULT_DATA_TYPE", "temperature")
    }

    /// Number of days shown on the dashboard when none is requested
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `DEFAULT_PERIOD_DAYS` is not a number
    pub fn default_period_days(&self) -> Result<u32, ConfigError> {
        parse_var("DEFAULT_PERIOD_DAYS", 7)
    }

    /// Port the HTTP server binds to
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `PORT` is not a valid port number
    pub fn port(&self) -> Result<u16, ConfigError> {
        parse_var("PORT", 8001)
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development { .. } | Self::Staging)
    }

    /// Whether logs should be emitted as JSON
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development { .. } => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let region = RegionProviderChain::default_provider().or_else(DEFAULT_AWS_REGION);

        let mut config_builder = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // Override "force path style" to true for compatibility with LocalStack
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if matches!(self, Self::Development { .. }) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// Presigned URL expiry time in seconds
    #[must_use]
    pub fn presigned_url_expiry_secs(&self) -> u64 {
        match self {
            Self::Production | Self::Staging => DEFAULT_EXPIRY_SECS,
            Self::Development {
                presign_expiry_override,
            } => presign_expiry_override.unwrap_or(DEFAULT_EXPIRY_SECS),
        }
    }
}
