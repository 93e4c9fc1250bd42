mod environment;
mod error;
mod extractors;

pub use environment::{ConfigError, Environment};
pub use error::{ApiErrorResponse, AppError};
pub use extractors::ApiQuery;
