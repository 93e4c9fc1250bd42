//! Server-rendered dashboard page

use std::sync::Arc;

use axum::{
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Extension,
};
use chrono::TimeDelta;
use sensor_storage::SensorReadings;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    chart::{render_dashboard_page, render_error_page, render_time_series},
    civil_time::{format_key, now_jst},
};

/// Dashboard selection used when the query string leaves it out
#[derive(Debug, Clone)]
pub struct DashboardDefaults {
    /// Series to plot
    pub data_type: String,
    /// Length of the plotted window, ending now
    pub period_days: u32,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    data_type: Option<String>,
    days: Option<u32>,
}

/// Wraps a rendered document, falling back to a bare 500 when rendering failed
fn page(status: StatusCode, rendered: askama::Result<String>) -> Response {
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render page: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn error_page(status: StatusCode, message: &str) -> Response {
    page(status, render_error_page(message))
}

/// Renders the chart of the last `days` days of `data_type`
#[instrument(skip_all)]
pub async fn handler(
    Extension(sensor_readings): Extension<Arc<dyn SensorReadings>>,
    Extension(defaults): Extension<DashboardDefaults>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let data_type = query.data_type.unwrap_or(defaults.data_type);
    let days = query.days.unwrap_or(defaults.period_days);

    let end = now_jst();
    let Some(start) = TimeDelta::try_days(i64::from(days))
        .and_then(|period| end.checked_sub_signed(period))
    else {
        tracing::warn!(days, "dashboard period out of range");
        return error_page(
            StatusCode::BAD_REQUEST,
            &format!("Period of {days} days is out of range."),
        );
    };
    let (start, end) = (format_key(start), format_key(end));

    tracing::info!(data_type = %data_type, days, start = %start, end = %end, "rendering dashboard");

    match sensor_readings.query(&data_type, &start, &end).await {
        Ok(readings) => page(
            StatusCode::OK,
            render_time_series(&readings)
                .and_then(|chart| render_dashboard_page(&data_type, days, &chart)),
        ),
        Err(e) => {
            tracing::error!("Failed to load dashboard data: {e}");
            error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Failed to load sensor data: {e}"),
            )
        }
    }
}
