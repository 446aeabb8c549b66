//! Personal library: progress, favorites, profiles and statistics.

pub mod cache;
pub mod favorites;
pub mod locks;
pub mod profile;
pub mod progress;
pub mod stats;
pub mod view;

pub use cache::{LibrarySnapshot, LibraryStateCache};
pub use favorites::FavoriteRepository;
pub use locks::KeyedLocks;
pub use profile::ProfileRepository;
pub use progress::ProgressRepository;
pub use stats::StatsAggregator;
pub use view::{CategoryTag, LibraryEntry};

use crate::error::{AppError, Result};
use crate::store::{Document, DocumentStore, Query, compare_values, with_timeout};
use std::time::Duration;

/// Fetch every document of `collection` owned by `user_id`, newest first.
///
/// Sorting is left to the store when it has a matching composite index.
/// Without one the query is retried unordered and sorted here.
pub(crate) async fn query_newest_first(
    store: &dyn DocumentStore,
    timeout: Duration,
    collection: &str,
    user_id: &str,
    order_field: &str,
) -> Result<Vec<Document>> {
    let query = Query::new()
        .filter("userId", user_id)
        .order_by_desc(order_field);

    match with_timeout(timeout, collection, store.query(collection, &query)).await {
        Err(AppError::MissingIndex(reason)) => {
            tracing::warn!(
                collection,
                %reason,
                "Missing composite index, sorting in memory"
            );

            let mut docs =
                with_timeout(timeout, collection, store.query(collection, &query.unordered()))
                    .await?;
            docs.sort_by(|a, b| compare_values(b.field(order_field), a.field(order_field)));
            Ok(docs)
        }
        other => other,
    }
}

/// Query matching the record of `user_id` for `story_id`.
pub(crate) fn owned_by(user_id: &str, story_id: &str) -> Query {
    Query::new()
        .filter("userId", user_id)
        .filter("storyId", story_id)
}
