use axum::response::Response;
use http_body_util::BodyExt;
use sensor_storage::SensorReading;

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Read response body as text
pub async fn response_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Build a sensor reading row
pub fn reading(data_type: &str, insert_date: &str, avg_value: f64) -> SensorReading {
    SensorReading {
        data_type: data_type.to_string(),
        insert_date: insert_date.to_string(),
        avg_value,
    }
}

/// Percent-encode the space of a `YYYY-MM-DD HH:MM:SS` query value
pub fn encode_timestamp(timestamp: &str) -> String {
    timestamp.replace(' ', "%20")
}
