//! Favorite records.

use super::locks::{KeyedLocks, record_key};
use super::{owned_by, query_newest_first};
use crate::error::Result;
use crate::models::{FAVORITES, FavoriteRecord, now_timestamp};
use crate::store::{Document, DocumentStore, with_timeout};
use std::sync::Arc;
use std::time::Duration;

/// Reads and writes [`FavoriteRecord`]s.
#[derive(Clone)]
pub struct FavoriteRepository {
    store: Arc<dyn DocumentStore>,
    locks: KeyedLocks,
    timeout: Duration,
}

impl FavoriteRepository {
    /// Create a repository over `store`.
    pub fn new(store: Arc<dyn DocumentStore>, locks: KeyedLocks, timeout: Duration) -> Self {
        Self {
            store,
            locks,
            timeout,
        }
    }

    /// Add a favorite. Returns `false` without writing when the story is
    /// already a favorite.
    pub async fn add(&self, mut record: FavoriteRecord) -> Result<bool> {
        let _guard = self
            .locks
            .lock(record_key(FAVORITES, &record.user_id, &record.story_id))
            .await;

        if self.find(&record.user_id, &record.story_id).await?.is_some() {
            return Ok(false);
        }

        record.added_at = now_timestamp();
        let data = serde_json::to_value(&record)?;
        with_timeout(self.timeout, "insert favorite", self.store.add(FAVORITES, data)).await?;

        tracing::debug!(user = %record.user_id, story = %record.story_id, "Added favorite");
        Ok(true)
    }

    /// Remove a favorite. Returns `false` when there was nothing to remove.
    pub async fn remove(&self, user_id: &str, story_id: &str) -> Result<bool> {
        let _guard = self
            .locks
            .lock(record_key(FAVORITES, user_id, story_id))
            .await;

        let Some(id) = self.find(user_id, story_id).await?.and_then(|f| f.id) else {
            return Ok(false);
        };

        with_timeout(
            self.timeout,
            "delete favorite",
            self.store.delete(FAVORITES, &id),
        )
        .await?;

        tracing::debug!(user = %user_id, story = %story_id, "Removed favorite");
        Ok(true)
    }

    /// Favorite of `user_id` for `story_id`, if any.
    pub async fn find(&self, user_id: &str, story_id: &str) -> Result<Option<FavoriteRecord>> {
        let docs = with_timeout(
            self.timeout,
            "find favorite",
            self.store
                .query(FAVORITES, &owned_by(user_id, story_id).limit(1)),
        )
        .await?;

        docs.first().map(decode).transpose()
    }

    /// All favorites of a user, most recently added first.
    pub async fn query_by_user(&self, user_id: &str) -> Result<Vec<FavoriteRecord>> {
        let docs = query_newest_first(
            self.store.as_ref(),
            self.timeout,
            FAVORITES,
            user_id,
            "addedAt",
        )
        .await?;

        docs.iter().map(decode).collect()
    }
}

fn decode(doc: &Document) -> Result<FavoriteRecord> {
    let mut record: FavoriteRecord = doc.decode()?;
    record.id = Some(doc.id.clone());
    Ok(record)
}
