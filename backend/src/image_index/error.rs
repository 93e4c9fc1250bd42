//! Error types for image resolution

use thiserror::Error;

use crate::object_store::BucketError;

/// Result type for image resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors that can occur while resolving a timestamp to an image.
///
/// An empty candidate set is not an error; see [`super::ImageIndex::find_closest`].
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The query timestamp is not `YYYY-MM-DD HH:MM:SS` or not a real date-time
    #[error("{0}")]
    MalformedQuery(String),

    /// The store could not be listed
    #[error("Failed to list images: {0}")]
    ListingFailed(#[from] BucketError),
}
