use std::sync::Arc;

use axum::{http::StatusCode, Extension, Json};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    image_index::ImageIndex,
    image_link::ImageLinkIssuer,
    types::{ApiQuery, AppError},
};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImageQuery {
    /// JST wall-clock time, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ImageResponse {
    /// Presigned URL to download the snapshot
    pub image_url: String,
    /// S3 key of the snapshot
    pub image_key: String,
}

/// Finds the camera snapshot taken closest to a timestamp
///
/// 1. Resolves the timestamp to the key of the nearest snapshot
/// 2. Exchanges that key for a short-lived presigned GET URL
///
/// # Errors
///
/// - 400 when `timestamp` is not `YYYY-MM-DD HH:MM:SS`
/// - 404 when no snapshot is stored under the configured prefix
/// - 500 when the bucket is not configured, the listing fails, or no URL could be issued
#[instrument(skip_all)]
pub async fn image_for_timestamp(
    Extension(image_index): Extension<Arc<ImageIndex>>,
    Extension(image_link_issuer): Extension<Arc<ImageLinkIssuer>>,
    ApiQuery(query): ApiQuery<ImageQuery>,
) -> Result<Json<ImageResponse>, AppError> {
    if image_index.bucket().is_empty() {
        return Err(AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "S3 service not configured: Bucket name missing.",
        ));
    }

    tracing::info!("Received request for image closest to timestamp: {}", query.timestamp);

    let Some(image_key) = image_index.find_closest(&query.timestamp).await? else {
        return Err(AppError::not_found("No image found matching the timestamp."));
    };

    let Some(image_url) = image_link_issuer.issue_url(Some(&image_key)).await else {
        tracing::error!("Could not generate presigned URL for key: {image_key}");
        return Err(AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Could not generate image URL.",
        ));
    };

    tracing::info!("Found image: {image_key}");

    Ok(Json(ImageResponse {
        image_url,
        image_key,
    }))
}
