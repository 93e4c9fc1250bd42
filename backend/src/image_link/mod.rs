//! Short-lived retrieval links for snapshots
//!
//! Unlike [`crate::image_index`], failures here are not errors: any signing problem
//! yields `None` and is logged, leaving the caller to decide what a missing link means.

use std::sync::Arc;

use crate::object_store::ObjectStore;

/// Default validity of an issued link, in seconds
pub const DEFAULT_EXPIRY_SECS: u64 = 3600;

/// Exchanges snapshot keys for presigned `GET` URLs
pub struct ImageLinkIssuer {
    object_store: Arc<dyn ObjectStore>,
    expiry_secs: u64,
}

impl ImageLinkIssuer {
    /// Creates a new link issuer
    ///
    /// # Arguments
    ///
    /// * `object_store` - Store the keys belong to
    /// * `expiry_secs` - Validity of links issued by [`Self::issue_url`]
    #[must_use]
    pub fn new(object_store: Arc<dyn ObjectStore>, expiry_secs: u64) -> Self {
        Self {
            object_store,
            expiry_secs,
        }
    }

    /// Configured link validity in seconds
    #[must_use]
    pub const fn expiry_secs(&self) -> u64 {
        self.expiry_secs
    }

    /// Issues a link for `key` valid for the configured expiry
    pub async fn issue_url(&self, key: Option<&str>) -> Option<String> {
        self.issue_url_with_expiry(key, self.expiry_secs).await
    }

    /// Issues a link for `key` valid for `expiry_secs`.
    ///
    /// Returns `None` for an absent or empty key and on any signing failure.
    pub async fn issue_url_with_expiry(&self, key: Option<&str>, expiry_secs: u64) -> Option<String> {
        let key = key.filter(|key| !key.is_empty())?;

        match self.object_store.presign_get(key, expiry_secs).await {
            Ok(presigned) => {
                tracing::debug!(key, expires_at = %presigned.expires_at, "issued image url");
                Some(presigned.url)
            }
            Err(e) => {
                tracing::error!("Error generating presigned URL for {key}: {e}");
                None
            }
        }
    }
}
