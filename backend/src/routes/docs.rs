//! API reference rendered from the generated OpenAPI document

use aide::{axum::ApiRouter, openapi::OpenApi, scalar::Scalar};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json,
};

use crate::types::Environment;

const OPENAPI_PATH: &str = "/openapi.json";

pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .route(
            "/docs",
            Scalar::new(OPENAPI_PATH)
                .with_title("Plant Monitor API Docs")
                .axum_route(),
        )
        .route(OPENAPI_PATH, get(openapi_document))
}

/// Served in development and staging only
#[allow(clippy::unused_async)]
async fn openapi_document(
    Extension(environment): Extension<Environment>,
    Extension(openapi): Extension<OpenApi>,
) -> Response {
    if environment.show_api_docs() {
        Json(openapi).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
