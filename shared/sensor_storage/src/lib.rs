//! Sensor storage services for the plant monitor
//!
//! This crate reads the aggregated sensor time series (temperature, pH, ...) that the
//! ingestion side writes into Dynamo DB. It never writes.

pub mod readings;

pub use readings::{
    SensorReading, SensorReadingStorage, SensorReadings, SensorStorageError, SensorStorageResult,
    INSERT_DATE_FORMAT,
};
