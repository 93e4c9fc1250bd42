//! Read-only access to the camera snapshot bucket
//!
//! [`ObjectStore`] is the capability set the image lookup needs from blob storage:
//! a flattened listing under a prefix and presigned `GET` URLs. [`S3ObjectStore`]
//! is the production implementation; tests inject the in-memory store from [`mock`].
mod error;

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_sdk_s3::{presigning::PresigningConfig, primitives::DateTime as SmithyDateTime, Client as S3Client};
use chrono::{DateTime, FixedOffset, NaiveDateTime, SubsecRound, Utc};

pub use error::{BucketError, BucketResult};

/// Presigned URL with expiration information
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL for GET operations
    pub url: String,
    /// ISO-8601 UTC timestamp when the URL expires
    pub expires_at: DateTime<Utc>,
}

/// A point in time as reported by a store, with or without a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectTime {
    /// Wall-clock time with no zone attached
    Naive(NaiveDateTime),
    /// Time carrying an explicit offset (UTC included)
    Zoned(DateTime<FixedOffset>),
}

impl ObjectTime {
    /// Places this time on the given offset.
    ///
    /// A naive value is taken to already be wall-clock time at `offset`; a zoned
    /// value is converted.
    #[must_use]
    pub fn at_offset(&self, offset: FixedOffset) -> DateTime<FixedOffset> {
        match self {
            Self::Naive(naive) => DateTime::from_naive_utc_and_offset(*naive - offset, offset),
            Self::Zoned(zoned) => zoned.with_timezone(&offset),
        }
    }

    fn from_smithy(value: &SmithyDateTime) -> Option<Self> {
        DateTime::<Utc>::from_timestamp(value.secs(), value.subsec_nanos())
            .map(|utc| Self::Zoned(utc.fixed_offset()))
    }
}

/// One entry of a bucket listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object key
    pub key: String,
    /// Last modification time, when the store reports one
    pub last_modified: Option<ObjectTime>,
}

/// Object store capabilities used by the image lookup
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket this store is bound to
    fn bucket(&self) -> &str;

    /// Lists every object under `prefix`, following pagination to the end
    ///
    /// # Errors
    ///
    /// Returns `BucketError` when any page of the listing fails
    async fn list_objects(&self, prefix: &str) -> BucketResult<Vec<StoredObject>>;

    /// Generates a presigned URL for a `GET` of exactly `key`
    ///
    /// # Errors
    ///
    /// Returns `BucketError` when the presigning config is invalid or signing fails
    async fn presign_get(&self, key: &str, expiry_secs: u64) -> BucketResult<PresignedUrl>;
}

/// S3 implementation of [`ObjectStore`]
pub struct S3ObjectStore {
    s3_client: Arc<S3Client>,
    bucket_name: String,
}

impl S3ObjectStore {
    /// Creates a new S3 object store
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client, shared for the life of the process
    /// * `bucket_name` - Bucket holding the camera snapshots
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String) -> Self {
        Self {
            s3_client,
            bucket_name,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket_name
    }

    async fn list_objects(&self, prefix: &str) -> BucketResult<Vec<StoredObject>> {
        let mut pages = self
            .s3_client
            .list_objects_v2()
            .bucket(&self.bucket_name)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page?;
            for object in page.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                objects.push(StoredObject {
                    key: key.to_string(),
                    last_modified: object.last_modified().and_then(ObjectTime::from_smithy),
                });
            }
        }

        tracing::debug!(
            bucket = %self.bucket_name,
            prefix,
            count = objects.len(),
            "listed objects"
        );

        Ok(objects)
    }

    async fn presign_get(&self, key: &str, expiry_secs: u64) -> BucketResult<PresignedUrl> {
        // X-Amz-Date has whole-second precision
        let signed_at = Utc::now().trunc_subsecs(0);
        let expires_in = Duration::from_secs(expiry_secs);

        let presigned_config = PresigningConfig::builder()
            .start_time(SystemTime::from(signed_at))
            .expires_in(expires_in)
            .build()
            .map_err(|e| {
                BucketError::ConfigError(format!("Failed to create presigning config: {e}"))
            })?;

        let presigned_request = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigned_config)
            .await
            .map_err(|e| BucketError::S3Error(format!("Failed to generate presigned URL: {e}")))?;

        Ok(PresignedUrl {
            url: presigned_request.uri().to_string(),
            expires_at: signed_at + expires_in,
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDateTime, Utc};

    use super::{BucketError, BucketResult, ObjectStore, ObjectTime, PresignedUrl, StoredObject};

    /// In-memory bucket with scripted contents and switchable failures
    pub struct MockObjectStore {
        bucket_name: String,
        objects: Vec<StoredObject>,
        fail_listing: bool,
        fail_signing: bool,
        list_calls: AtomicUsize,
    }

    impl MockObjectStore {
        #[must_use]
        pub fn new(objects: Vec<StoredObject>) -> Self {
            Self {
                bucket_name: "plant-monitor-test".to_string(),
                objects,
                fail_listing: false,
                fail_signing: false,
                list_calls: AtomicUsize::new(0),
            }
        }

        /// Objects with no modification time, as Policy A sees them
        #[must_use]
        pub fn with_keys(keys: &[&str]) -> Self {
            Self::new(
                keys.iter()
                    .map(|key| StoredObject {
                        key: (*key).to_string(),
                        last_modified: None,
                    })
                    .collect(),
            )
        }

        #[must_use]
        pub fn with_bucket_name(mut self, bucket_name: &str) -> Self {
            self.bucket_name = bucket_name.to_string();
            self
        }

        #[must_use]
        pub const fn failing_listing(mut self) -> Self {
            self.fail_listing = true;
            self
        }

        #[must_use]
        pub const fn failing_signing(mut self) -> Self {
            self.fail_signing = true;
            self
        }

        /// Number of listing calls made so far
        #[must_use]
        pub fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        /// Builds an entry with a naive modification time (`YYYY-MM-DD HH:MM:SS`)
        ///
        /// # Panics
        ///
        /// Panics if `naive` is not in the expected format
        #[must_use]
        pub fn naive_object(key: &str, naive: &str) -> StoredObject {
            StoredObject {
                key: key.to_string(),
                last_modified: Some(ObjectTime::Naive(
                    NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S")
                        .expect("valid naive timestamp"),
                )),
            }
        }

        /// Builds an entry with a zoned modification time (RFC 3339)
        ///
        /// # Panics
        ///
        /// Panics if `rfc3339` is not a valid RFC 3339 timestamp
        #[must_use]
        pub fn zoned_object(key: &str, rfc3339: &str) -> StoredObject {
            StoredObject {
                key: key.to_string(),
                last_modified: Some(ObjectTime::Zoned(
                    DateTime::parse_from_rfc3339(rfc3339).expect("valid RFC 3339 timestamp"),
                )),
            }
        }
    }

    #[async_trait]
    impl ObjectStore for MockObjectStore {
        fn bucket(&self) -> &str {
            &self.bucket_name
        }

        async fn list_objects(&self, prefix: &str) -> BucketResult<Vec<StoredObject>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);

            if self.fail_listing {
                return Err(BucketError::UpstreamError("S3 unreachable".to_string()));
            }

            Ok(self
                .objects
                .iter()
                .filter(|object| object.key.starts_with(prefix))
                .cloned()
                .collect())
        }

        async fn presign_get(&self, key: &str, expiry_secs: u64) -> BucketResult<PresignedUrl> {
            if self.fail_signing {
                return Err(BucketError::S3Error("AccessDenied".to_string()));
            }

            Ok(PresignedUrl {
                url: format!(
                    "https://s3.example.com/{}/{key}?X-Amz-Expires={expiry_secs}",
                    self.bucket_name
                ),
                expires_at: Utc::now()
                    + chrono::TimeDelta::seconds(i64::try_from(expiry_secs).unwrap_or(i64::MAX)),
            })
        }
    }
}
