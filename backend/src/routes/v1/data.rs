//! Sensor series endpoints consumed by the dashboard client

use std::sync::Arc;

use axum::{http::StatusCode, Extension, Json};
use chrono::{NaiveDateTime, TimeDelta};
use schemars::JsonSchema;
use sensor_storage::{SensorReading, SensorReadings};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    civil_time::{format_key, now_jst, parse_iso_to_civil, to_rfc3339},
    types::{ApiQuery, AppError},
};

/// Sensor every reading currently comes from
pub const DEVICE_ID: &str = "sensor_001";

/// Where that sensor is installed
pub const LOCATION: &str = "greenhouse-a";

/// Window used when the caller gives no explicit range
const DEFAULT_LOOKBACK_DAYS: i64 = 365;

const fn default_limit() -> usize {
    1000
}

fn default_period() -> String {
    "day".to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DataQuery {
    /// Series name, e.g. `temperature` or `pH`
    pub data_type: String,
    /// Range start, ISO-8601
    pub start_time: Option<String>,
    /// Range end, ISO-8601
    pub end_time: Option<String>,
    /// Maximum number of points returned
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LatestQuery {
    /// Series name, e.g. `temperature` or `pH`
    pub data_type: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SummaryQuery {
    /// Series name, e.g. `temperature` or `pH`
    pub data_type: String,
    /// Label echoed back in the summary
    #[serde(default = "default_period")]
    pub period: String,
    /// Range start, ISO-8601
    pub start_time: Option<String>,
    /// Range end, ISO-8601
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SensorDataPoint {
    /// RFC 3339 with the JST offset
    pub timestamp: String,
    pub value: f64,
    pub device_id: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DataSummary {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub count: usize,
    pub period: String,
}

/// Resolves an optional ISO-8601 range into sort-key bounds.
///
/// Unless both ends are given, the last [`DEFAULT_LOOKBACK_DAYS`] days are used.
fn key_range(start: Option<&str>, end: Option<&str>) -> Result<(String, String), AppError> {
    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => {
            let start = parse_iso_to_civil(start).map_err(|e| {
                AppError::new(StatusCode::BAD_REQUEST, format!("Invalid start_time: {e}"))
            })?;
            let end = parse_iso_to_civil(end).map_err(|e| {
                AppError::new(StatusCode::BAD_REQUEST, format!("Invalid end_time: {e}"))
            })?;
            (start, end)
        }
        _ => {
            let end = now_jst();
            (end - TimeDelta::days(DEFAULT_LOOKBACK_DAYS), end)
        }
    };

    Ok((format_key(start), format_key(end)))
}

/// Readings with a parseable sort key, oldest first
fn chronological(readings: Vec<SensorReading>) -> Vec<(NaiveDateTime, SensorReading)> {
    let mut dated: Vec<(NaiveDateTime, SensorReading)> = readings
        .into_iter()
        .filter_map(|reading| match reading.recorded_at() {
            Some(at) => Some((at, reading)),
            None => {
                tracing::warn!(
                    "Skipping reading with unparseable insert_date: {}",
                    reading.insert_date
                );
                None
            }
        })
        .collect();
    dated.sort_by_key(|(at, _)| *at);
    dated
}

fn to_data_point(at: NaiveDateTime, reading: &SensorReading) -> SensorDataPoint {
    SensorDataPoint {
        timestamp: to_rfc3339(at),
        value: reading.avg_value,
        device_id: DEVICE_ID.to_string(),
        location: LOCATION.to_string(),
    }
}

/// Aggregates values into a summary; an empty slice summarizes to zeros
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn summarize(values: &[f64], period: String) -> DataSummary {
    if values.is_empty() {
        return DataSummary {
            average: 0.0,
            minimum: 0.0,
            maximum: 0.0,
            count: 0,
            period,
        };
    }

    DataSummary {
        average: values.iter().sum::<f64>() / values.len() as f64,
        minimum: values.iter().copied().fold(f64::INFINITY, f64::min),
        maximum: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        count: values.len(),
        period,
    }
}

/// Returns a series within a time range, oldest first
///
/// # Errors
///
/// - 400 when `start_time` or `end_time` is not ISO-8601
/// - 500 when the sensor store cannot be queried
#[instrument(skip_all)]
pub async fn get_sensor_data(
    Extension(sensor_readings): Extension<Arc<dyn SensorReadings>>,
    ApiQuery(query): ApiQuery<DataQuery>,
) -> Result<Json<Vec<SensorDataPoint>>, AppError> {
    let (start, end) = key_range(query.start_time.as_deref(), query.end_time.as_deref())?;
    tracing::info!(data_type = %query.data_type, %start, %end, "fetching sensor data");

    let readings = sensor_readings.query(&query.data_type, &start, &end).await?;

    Ok(Json(
        chronological(readings)
            .iter()
            .take(query.limit)
            .map(|(at, reading)| to_data_point(*at, reading))
            .collect(),
    ))
}

/// Returns the newest reading of a series from the last year, or `null`
///
/// # Errors
///
/// - 500 when the sensor store cannot be queried
#[instrument(skip_all)]
pub async fn get_latest_data(
    Extension(sensor_readings): Extension<Arc<dyn SensorReadings>>,
    ApiQuery(query): ApiQuery<LatestQuery>,
) -> Result<Json<Option<SensorDataPoint>>, AppError> {
    let (start, end) = key_range(None, None)?;
    let readings = sensor_readings.query(&query.data_type, &start, &end).await?;

    Ok(Json(
        chronological(readings)
            .last()
            .map(|(at, reading)| to_data_point(*at, reading)),
    ))
}

/// Returns average, minimum and maximum of a series over a range
///
/// # Errors
///
/// - 400 when `start_time` or `end_time` is not ISO-8601
/// - 500 when the sensor store cannot be queried
#[instrument(skip_all)]
pub async fn get_data_summary(
    Extension(sensor_readings): Extension<Arc<dyn SensorReadings>>,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> Result<Json<DataSummary>, AppError> {
    let (start, end) = key_range(query.start_time.as_deref(), query.end_time.as_deref())?;
    let readings = sensor_readings.query(&query.data_type, &start, &end).await?;

    let values: Vec<f64> = readings.iter().map(|reading| reading.avg_value).collect();
    Ok(Json(summarize(&values, query.period)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], "week".to_string());
        assert_eq!(
            summary,
            DataSummary {
                average: 0.0,
                minimum: 0.0,
                maximum: 0.0,
                count: 0,
                period: "week".to_string(),
            }
        );
    }

    #[test]
    fn test_summarize_values() {
        let summary = summarize(&[20.0, 22.0, 27.0], "day".to_string());
        assert_eq!(summary.average, 23.0);
        assert_eq!(summary.minimum, 20.0);
        assert_eq!(summary.maximum, 27.0);
        assert_eq!(summary.count, 3);
    }

    #[test]
    fn test_key_range_converts_iso() {
        let (start, end) =
            key_range(Some("2025-01-26T00:00:00Z"), Some("2025-01-27T00:00:00+09:00")).unwrap();
        assert_eq!(start, "2025-01-26 09:00:00");
        assert_eq!(end, "2025-01-27 00:00:00");
    }

    #[test]
    fn test_key_range_rejects_garbage() {
        let err = key_range(Some("soon"), Some("2025-01-27T00:00:00Z")).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_key_range_defaults_to_last_year() {
        let (start, end) = key_range(Some("2025-01-26T00:00:00Z"), None).unwrap();
        let start = NaiveDateTime::parse_from_str(&start, "%Y-%m-%d %H:%M:%S").unwrap();
        let end = NaiveDateTime::parse_from_str(&end, "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(end - start, TimeDelta::days(365));
    }

    #[test]
    fn test_chronological_sorts_and_skips_bad_keys() {
        let reading = |insert_date: &str, avg_value| SensorReading {
            data_type: "pH".to_string(),
            insert_date: insert_date.to_string(),
            avg_value,
        };

        let sorted = chronological(vec![
            reading("2025-01-26 12:00:00", 6.9),
            reading("garbage", 0.0),
            reading("2025-01-26 09:00:00", 6.5),
        ]);

        let values: Vec<f64> = sorted.iter().map(|(_, r)| r.avg_value).collect();
        assert_eq!(values, vec![6.5, 6.9]);
    }
}
