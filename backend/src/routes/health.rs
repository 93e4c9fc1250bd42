use std::sync::Arc;

use aide::axum::IntoApiResponse;
use axum::{Extension, Json};
use schemars::JsonSchema;
use serde::Serialize;

use crate::image_index::ImageIndex;

#[derive(Debug, Serialize, JsonSchema)]
pub struct HealthResponse {
    status: &'static str,
    /// Version of the running build
    semver: &'static str,
    /// Commit hash of the build, if it was stamped
    rev: Option<&'static str>,
    /// Bucket snapshots are looked up in
    bucket: String,
    /// How snapshot capture times are determined
    timestamp_policy: String,
}

/// Health check with the snapshot lookup configuration
pub async fn handler(Extension(image_index): Extension<Arc<ImageIndex>>) -> impl IntoApiResponse {
    Json(HealthResponse {
        status: "ok",
        semver: env!("CARGO_PKG_VERSION"),
        rev: option_env!("GIT_REV"),
        bucket: image_index.bucket().to_string(),
        timestamp_policy: image_index.policy().to_string(),
    })
}
