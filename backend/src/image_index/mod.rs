//! Nearest-in-time lookup over the camera snapshot bucket
//!
//! Every lookup lists the bucket afresh; nothing is cached between requests, so a
//! snapshot is visible as soon as the store lists it.
mod error;
mod timestamp;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use strum::{Display, EnumString};

use crate::civil_time::JST;
use crate::object_store::{ObjectStore, ObjectTime, StoredObject};

pub use error::{ResolveError, ResolveResult};
pub use timestamp::{
    extract_key_timestamp, has_image_extension, parse_query, IMAGE_EXTENSIONS, QUERY_FORMAT,
};

/// How a snapshot gets its capture time, and which objects count as snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TimestampPolicy {
    /// Parse `YYYY[-]MM[-]DD_HH[-]MM[-]SS` out of the key; extension is irrelevant
    KeyPattern,
    /// Use the store's last-modified time; only image extensions are eligible
    LastModified,
}

/// A snapshot with a resolved capture time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampedObject {
    /// Object key
    pub key: String,
    /// Capture time, possibly without a zone
    pub timestamp: ObjectTime,
}

impl TimestampedObject {
    /// Capture time as JST
    #[must_use]
    pub fn in_jst(&self) -> DateTime<FixedOffset> {
        self.timestamp.at_offset(JST)
    }
}

impl TimestampPolicy {
    /// Resolves a listing entry into a snapshot, or `None` when it is not eligible
    #[must_use]
    pub fn resolve(self, object: StoredObject) -> Option<TimestampedObject> {
        let timestamp = match self {
            Self::KeyPattern => ObjectTime::Naive(extract_key_timestamp(&object.key)?),
            Self::LastModified => {
                if !has_image_extension(&object.key) {
                    return None;
                }
                object.last_modified?
            }
        };

        Some(TimestampedObject {
            key: object.key,
            timestamp,
        })
    }
}

/// Resolves timestamps to snapshot keys
pub struct ImageIndex {
    object_store: Arc<dyn ObjectStore>,
    prefix: String,
    policy: TimestampPolicy,
}

impl ImageIndex {
    /// Creates a new image index
    ///
    /// # Arguments
    ///
    /// * `object_store` - Store holding the snapshots
    /// * `prefix` - Key prefix searched by [`Self::find_closest`]
    /// * `policy` - Timestamp policy for every listed object
    #[must_use]
    pub fn new(object_store: Arc<dyn ObjectStore>, prefix: String, policy: TimestampPolicy) -> Self {
        Self {
            object_store,
            prefix,
            policy,
        }
    }

    /// Bucket the underlying store is bound to
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.object_store.bucket()
    }

    /// Active timestamp policy
    #[must_use]
    pub const fn policy(&self) -> TimestampPolicy {
        self.policy
    }

    /// Lists every eligible snapshot under `prefix`, in store order
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::ListingFailed` when the store cannot be listed
    pub async fn list_images(&self, prefix: &str) -> ResolveResult<Vec<TimestampedObject>> {
        let objects = self.object_store.list_objects(prefix).await.map_err(|e| {
            tracing::error!("Error listing objects under '{prefix}': {e}");
            ResolveError::from(e)
        })?;

        let listed = objects.len();
        let images: Vec<TimestampedObject> = objects
            .into_iter()
            .filter_map(|object| self.policy.resolve(object))
            .collect();

        tracing::debug!(
            prefix,
            policy = %self.policy,
            listed,
            eligible = images.len(),
            "listed images"
        );

        Ok(images)
    }

    /// Finds the key of the snapshot closest in time to `target`.
    ///
    /// `target` must be `YYYY-MM-DD HH:MM:SS` and is read as JST. When several
    /// snapshots are equally close, the earliest one wins. `Ok(None)` means the
    /// prefix holds no eligible snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::MalformedQuery` before touching the store if `target`
    /// does not parse, and `ResolveError::ListingFailed` if the listing fails
    pub async fn find_closest(&self, target: &str) -> ResolveResult<Option<String>> {
        let target = parse_query(target)?;
        let images = self.list_images(&self.prefix).await?;

        let closest = closest_to(&images, target).map(|image| image.key.clone());

        tracing::info!(
            query = %target,
            candidates = images.len(),
            closest = closest.as_deref().unwrap_or("<none>"),
            "resolved closest image"
        );

        Ok(closest)
    }
}

/// Minimum by distance to `target`, then by capture time, then by key
fn closest_to(
    images: &[TimestampedObject],
    target: DateTime<FixedOffset>,
) -> Option<&TimestampedObject> {
    images
        .iter()
        .map(|image| {
            let at = image.in_jst();
            ((at - target).abs(), at, image)
        })
        .min_by(|(distance_a, at_a, a), (distance_b, at_b, b)| {
            distance_a
                .cmp(distance_b)
                .then(at_a.cmp(at_b))
                .then_with(|| a.key.cmp(&b.key))
        })
        .map(|(_, _, image)| image)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::object_store::mock::MockObjectStore;

    const PREFIX: &str = "plant_images/";

    fn build_index(store: MockObjectStore, policy: TimestampPolicy) -> (Arc<MockObjectStore>, ImageIndex) {
        let store = Arc::new(store);
        let index = ImageIndex::new(store.clone(), PREFIX.to_string(), policy);
        (store, index)
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            TimestampPolicy::from_str("key_pattern").unwrap(),
            TimestampPolicy::KeyPattern
        );
        assert_eq!(
            TimestampPolicy::from_str("last_modified").unwrap(),
            TimestampPolicy::LastModified
        );
        assert!(TimestampPolicy::from_str("both").is_err());
    }

    #[tokio::test]
    async fn test_closest_picks_minimum_distance() {
        let (_, index) = build_index(
            MockObjectStore::with_keys(&[
                "plant_images/img_20231026_120000.jpg",
                "plant_images/img_20231026_120500.jpg",
                "plant_images/img_20231026_121000.jpg",
            ]),
            TimestampPolicy::KeyPattern,
        );

        let closest = index.find_closest("2023-10-26 12:03:00").await.unwrap();
        assert_eq!(
            closest.as_deref(),
            Some("plant_images/img_20231026_120500.jpg")
        );

        let closest = index.find_closest("2023-10-26 12:02:00").await.unwrap();
        assert_eq!(
            closest.as_deref(),
            Some("plant_images/img_20231026_120000.jpg")
        );
    }

    #[tokio::test]
    async fn test_closest_before_and_after_all_candidates() {
        let (_, index) = build_index(
            MockObjectStore::with_keys(&[
                "plant_images/img_20231026_120500.jpg",
                "plant_images/img_20231026_120000.jpg",
                "plant_images/img_20231026_121000.jpg",
            ]),
            TimestampPolicy::KeyPattern,
        );

        let closest = index.find_closest("2020-01-01 00:00:00").await.unwrap();
        assert_eq!(
            closest.as_deref(),
            Some("plant_images/img_20231026_120000.jpg")
        );

        let closest = index.find_closest("2030-01-01 00:00:00").await.unwrap();
        assert_eq!(
            closest.as_deref(),
            Some("plant_images/img_20231026_121000.jpg")
        );
    }

    #[tokio::test]
    async fn test_tie_goes_to_earliest_regardless_of_listing_order() {
        let keys = [
            "plant_images/img_20231026_121000.jpg",
            "plant_images/img_20231026_120800.jpg",
        ];

        for listing in [keys, [keys[1], keys[0]]] {
            let (_, index) = build_index(
                MockObjectStore::with_keys(&listing),
                TimestampPolicy::KeyPattern,
            );
            let closest = index.find_closest("2023-10-26 12:09:00").await.unwrap();
            assert_eq!(
                closest.as_deref(),
                Some("plant_images/img_20231026_120800.jpg"),
                "listing order {listing:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_identical_timestamps_break_on_key() {
        let (_, index) = build_index(
            MockObjectStore::with_keys(&[
                "plant_images/b_20231026_120000.jpg",
                "plant_images/a_2023-10-26_12-00-00.jpg",
            ]),
            TimestampPolicy::KeyPattern,
        );

        let closest = index.find_closest("2023-10-26 12:00:00").await.unwrap();
        assert_eq!(
            closest.as_deref(),
            Some("plant_images/a_2023-10-26_12-00-00.jpg")
        );
    }

    #[tokio::test]
    async fn test_empty_listing_is_no_match() {
        let (store, index) = build_index(MockObjectStore::new(Vec::new()), TimestampPolicy::KeyPattern);

        let closest = index.find_closest("2023-10-26 12:00:00").await.unwrap();
        assert_eq!(closest, None);
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_no_eligible_candidates_is_no_match() {
        let (_, index) = build_index(
            MockObjectStore::with_keys(&["plant_images/no_timestamp_here.jpg"]),
            TimestampPolicy::KeyPattern,
        );

        let closest = index.find_closest("2023-10-26 12:00:00").await.unwrap();
        assert_eq!(closest, None);
    }

    #[tokio::test]
    async fn test_malformed_query_never_lists() {
        let (store, index) = build_index(
            MockObjectStore::with_keys(&["plant_images/img_20231026_120000.jpg"]),
            TimestampPolicy::KeyPattern,
        );

        for query in ["INVALID-FORMAT", "2023-13-01 00:00:00", "2023-10-26"] {
            let err = index.find_closest(query).await.unwrap_err();
            assert!(matches!(err, ResolveError::MalformedQuery(_)), "{query}");
        }
        assert_eq!(store.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let (_, index) = build_index(
            MockObjectStore::with_keys(&["plant_images/img_20231026_120000.jpg"]).failing_listing(),
            TimestampPolicy::KeyPattern,
        );

        let err = index.find_closest("2023-10-26 12:00:00").await.unwrap_err();
        assert!(matches!(err, ResolveError::ListingFailed(_)));
    }

    #[tokio::test]
    async fn test_key_pattern_filtering() {
        let (_, index) = build_index(
            MockObjectStore::with_keys(&[
                "plant_images/img_20231026_120000.jpg",
                "plant_images/no_timestamp_here.jpg",
                "plant_images/2023-13-01_12-00-00.jpg",
                "plant_images/capture_20231026_115500.txt",
                "other/img_20231026_120000.jpg",
            ]),
            TimestampPolicy::KeyPattern,
        );

        let images = index.list_images(PREFIX).await.unwrap();
        let keys: Vec<&str> = images.iter().map(|image| image.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "plant_images/img_20231026_120000.jpg",
                "plant_images/capture_20231026_115500.txt",
            ]
        );
        assert_eq!(
            images[0].in_jst().to_rfc3339(),
            "2023-10-26T12:00:00+09:00"
        );
    }

    #[tokio::test]
    async fn test_last_modified_filtering() {
        let (_, index) = build_index(
            MockObjectStore::new(vec![
                MockObjectStore::zoned_object("plant_images/a.jpg", "2023-10-26T03:00:00Z"),
                MockObjectStore::zoned_object("plant_images/b.PNG", "2023-10-26T03:05:00Z"),
                MockObjectStore::zoned_object("plant_images/notes.txt", "2023-10-26T03:00:00Z"),
                MockObjectStore::zoned_object(
                    "plant_images/img_20231026_120000.csv",
                    "2023-10-26T03:00:00Z",
                ),
                StoredObject {
                    key: "plant_images/undated.jpg".to_string(),
                    last_modified: None,
                },
            ]),
            TimestampPolicy::LastModified,
        );

        let images = index.list_images(PREFIX).await.unwrap();
        let keys: Vec<&str> = images.iter().map(|image| image.key.as_str()).collect();
        assert_eq!(keys, vec!["plant_images/a.jpg", "plant_images/b.PNG"]);
    }

    #[tokio::test]
    async fn test_last_modified_ignores_key_timestamps() {
        let (_, index) = build_index(
            MockObjectStore::new(vec![
                // Key says noon, store says 12:10 JST
                MockObjectStore::zoned_object(
                    "plant_images/img_20231026_120000.jpg",
                    "2023-10-26T03:10:00Z",
                ),
                MockObjectStore::zoned_object("plant_images/late.jpg", "2023-10-26T03:01:00Z"),
            ]),
            TimestampPolicy::LastModified,
        );

        let closest = index.find_closest("2023-10-26 12:00:00").await.unwrap();
        assert_eq!(closest.as_deref(), Some("plant_images/late.jpg"));
    }

    #[tokio::test]
    async fn test_naive_and_utc_candidates_compare_equal() {
        // 12:08 JST naive and 03:10 UTC (12:10 JST) are each one minute from 12:09
        let (_, index) = build_index(
            MockObjectStore::new(vec![
                MockObjectStore::zoned_object("plant_images/utc.jpg", "2023-10-26T03:10:00Z"),
                MockObjectStore::naive_object("plant_images/naive.jpg", "2023-10-26 12:08:00"),
            ]),
            TimestampPolicy::LastModified,
        );
        let closest = index.find_closest("2023-10-26 12:09:00").await.unwrap();
        assert_eq!(closest.as_deref(), Some("plant_images/naive.jpg"));

        // Same civil instant, once naive and once as UTC: an exact tie on time
        let images = [
            TimestampedObject {
                key: "plant_images/b.jpg".to_string(),
                timestamp: MockObjectStore::naive_object("x", "2023-10-26 12:00:00")
                    .last_modified
                    .unwrap(),
            },
            TimestampedObject {
                key: "plant_images/a.jpg".to_string(),
                timestamp: MockObjectStore::zoned_object("x", "2023-10-26T03:00:00Z")
                    .last_modified
                    .unwrap(),
            },
        ];
        assert_eq!(images[0].in_jst(), images[1].in_jst());

        let target = parse_query("2023-10-26 12:30:00").unwrap();
        let distances: Vec<_> = images.iter().map(|i| (i.in_jst() - target).abs()).collect();
        assert_eq!(distances[0], distances[1]);
    }

    #[tokio::test]
    async fn test_offset_candidates_are_converted() {
        let (_, index) = build_index(
            MockObjectStore::new(vec![
                // 12:00 JST expressed at UTC-05:00
                MockObjectStore::zoned_object("plant_images/ny.jpg", "2023-10-25T22:00:00-05:00"),
                MockObjectStore::naive_object("plant_images/jst.jpg", "2023-10-26 12:30:00"),
            ]),
            TimestampPolicy::LastModified,
        );

        let closest = index.find_closest("2023-10-26 12:05:00").await.unwrap();
        assert_eq!(closest.as_deref(), Some("plant_images/ny.jpg"));
    }
}
