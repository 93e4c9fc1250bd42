//! Error types for sensor reading storage operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::query::QueryError;
use thiserror::Error;

/// Result type for sensor reading storage operations
pub type SensorStorageResult<T> = Result<T, SensorStorageError>;

/// Errors that can occur during sensor reading storage operations
#[derive(Error, Debug)]
pub enum SensorStorageError {
    /// Failed to query readings from Dynamo DB
    #[error("Failed to query sensor readings from DynamoDB: {0}")]
    DynamoDbQueryError(#[from] SdkError<QueryError>),

    /// A stored item could not be decoded into a reading
    #[error("Failed to parse sensor reading: {0}")]
    ParseReadingError(String),
}
