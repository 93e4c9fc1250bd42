//! Plant monitor backend service
//!
//! Serves the greenhouse dashboard: sensor time series from Dynamo DB rendered as a
//! chart, and the camera snapshot closest to any point on it.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

/// Chart and page rendering
pub mod chart;

/// JST civil time helpers
pub mod civil_time;

/// Nearest-in-time snapshot lookup
pub mod image_index;

/// Presigned snapshot links
pub mod image_link;

/// Object store client seam
pub mod object_store;

/// HTTP routes
pub mod routes;

/// Server assembly
pub mod server;

/// Configuration and API error types
pub mod types;
