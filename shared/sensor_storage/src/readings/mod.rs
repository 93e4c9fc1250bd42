//! Sensor reading storage integration using Dynamo DB
//!
//! Each series (`data_type`) is a partition; readings inside it are sorted by
//! `insert_date`, a `YYYY-MM-DD HH:MM:SS` string, so a lexicographic `BETWEEN`
//! on the sort key is a time-range query.

mod error;

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    types::{AttributeValue, Select},
    Client as DynamoDbClient,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::Display;

pub use error::{SensorStorageError, SensorStorageResult};

/// Format of the `insert_date` sort key
pub const INSERT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Attribute names for the aggregated readings table
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SensorReadingAttribute {
    /// Series name, e.g. `temperature` or `pH` (Partition Key)
    DataType,
    /// Civil time of the aggregation window (Sort Key)
    InsertDate,
    /// Aggregated value for the window
    AvgValue,
}

/// One aggregated reading of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Series name (Partition Key)
    pub data_type: String,
    /// `YYYY-MM-DD HH:MM:SS` (Sort Key)
    pub insert_date: String,
    /// Aggregated value
    pub avg_value: f64,
}

impl SensorReading {
    /// Parses the sort key into a civil date-time.
    ///
    /// Returns `None` when the stored key does not follow [`INSERT_DATE_FORMAT`].
    #[must_use]
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.insert_date, INSERT_DATE_FORMAT).ok()
    }
}

/// Read access to a time series, addressed by series name and an inclusive key range
#[async_trait]
pub trait SensorReadings: Send + Sync {
    /// Returns every reading of `data_type` whose `insert_date` lies in `[start, end]`
    ///
    /// # Errors
    ///
    /// Returns `SensorStorageError` if the backing store cannot be queried or an item
    /// cannot be decoded
    async fn query(
        &self,
        data_type: &str,
        start: &str,
        end: &str,
    ) -> SensorStorageResult<Vec<SensorReading>>;
}

/// Sensor reading storage client for Dynamo DB operations
pub struct SensorReadingStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl SensorReadingStorage {
    /// Creates a new sensor reading storage client
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured Dynamo DB client
    /// * `table_name` - Dynamo DB table holding the aggregated readings
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }

    /// Name of the table this client reads from
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl SensorReadings for SensorReadingStorage {
    async fn query(
        &self,
        data_type: &str,
        start: &str,
        end: &str,
    ) -> SensorStorageResult<Vec<SensorReading>> {
        tracing::debug!(data_type, start, end, "querying sensor readings");

        let mut readings = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let response = self
                .dynamodb_client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("#data_type = :data_type AND #insert_date BETWEEN :start AND :end")
                .expression_attribute_names("#data_type", SensorReadingAttribute::DataType.to_string())
                .expression_attribute_names(
                    "#insert_date",
                    SensorReadingAttribute::InsertDate.to_string(),
                )
                .expression_attribute_values(":data_type", AttributeValue::S(data_type.to_string()))
                .expression_attribute_values(":start", AttributeValue::S(start.to_string()))
                .expression_attribute_values(":end", AttributeValue::S(end.to_string()))
                .select(Select::AllAttributes)
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await?;

            for item in response.items() {
                let reading = serde_dynamo::from_item(item.clone())
                    .map_err(|e| SensorStorageError::ParseReadingError(e.to_string()))?;
                readings.push(reading);
            }

            // An empty key is what LocalStack returns on the last page
            match response.last_evaluated_key().filter(|key| !key.is_empty()) {
                Some(key) => exclusive_start_key = Some(key.clone()),
                None => break,
            }
        }

        tracing::info!(data_type, count = readings.len(), "fetched sensor readings");

        Ok(readings)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use async_trait::async_trait;
    use aws_sdk_dynamodb::error::SdkError;

    use super::{SensorReading, SensorReadings, SensorStorageError, SensorStorageResult};

    /// In-memory series store with the same range semantics as the Dynamo DB query
    pub struct MockSensorReadings {
        readings: Vec<SensorReading>,
        fail: bool,
    }

    impl MockSensorReadings {
        #[must_use]
        pub const fn new(readings: Vec<SensorReading>) -> Self {
            Self {
                readings,
                fail: false,
            }
        }

        /// A store whose every query fails at the transport level
        #[must_use]
        pub const fn unavailable() -> Self {
            Self {
                readings: Vec::new(),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl SensorReadings for MockSensorReadings {
        async fn query(
            &self,
            data_type: &str,
            start: &str,
            end: &str,
        ) -> SensorStorageResult<Vec<SensorReading>> {
            if self.fail {
                return Err(SensorStorageError::DynamoDbQueryError(
                    SdkError::construction_failure("dynamodb unavailable"),
                ));
            }

            Ok(self
                .readings
                .iter()
                .filter(|r| r.data_type == data_type)
                .filter(|r| r.insert_date.as_str() >= start && r.insert_date.as_str() <= end)
                .cloned()
                .collect())
        }
    }
}
