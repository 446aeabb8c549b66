//! Reading progress records.

use super::locks::{KeyedLocks, record_key};
use super::{owned_by, query_newest_first};
use crate::error::Result;
use crate::models::{ProgressRecord, READING_PROGRESS, now_timestamp};
use crate::store::{Document, DocumentStore, with_timeout};
use std::sync::Arc;
use std::time::Duration;

/// Reads and writes [`ProgressRecord`]s.
#[derive(Clone)]
pub struct ProgressRepository {
    store: Arc<dyn DocumentStore>,
    locks: KeyedLocks,
    timeout: Duration,
}

impl ProgressRepository {
    /// Create a repository over `store`.
    pub fn new(store: Arc<dyn DocumentStore>, locks: KeyedLocks, timeout: Duration) -> Self {
        Self {
            store,
            locks,
            timeout,
        }
    }

    /// Insert the record, or overwrite the existing one for the same
    /// user and story. `last_read` is always reset to now.
    pub async fn upsert(&self, mut record: ProgressRecord) -> Result<ProgressRecord> {
        let _guard = self
            .locks
            .lock(record_key(READING_PROGRESS, &record.user_id, &record.story_id))
            .await;

        let existing = self.find(&record.user_id, &record.story_id).await?;

        record.last_read = now_timestamp();
        let data = serde_json::to_value(&record)?;

        let id = match existing {
            Some(found) => {
                let id = found.id.unwrap_or_default();
                with_timeout(
                    self.timeout,
                    "replace progress",
                    self.store.set(READING_PROGRESS, &id, data),
                )
                .await?;
                id
            }
            None => {
                with_timeout(
                    self.timeout,
                    "insert progress",
                    self.store.add(READING_PROGRESS, data),
                )
                .await?
            }
        };

        tracing::debug!(
            user = %record.user_id,
            story = %record.story_id,
            progress = record.progress,
            "Saved reading progress"
        );

        record.id = Some(id);
        Ok(record)
    }

    /// Progress of `user_id` on `story_id`, if any.
    pub async fn find(&self, user_id: &str, story_id: &str) -> Result<Option<ProgressRecord>> {
        let docs = with_timeout(
            self.timeout,
            "find progress",
            self.store
                .query(READING_PROGRESS, &owned_by(user_id, story_id).limit(1)),
        )
        .await?;

        docs.first().map(decode).transpose()
    }

    /// All progress records of a user, most recently read first.
    pub async fn query_by_user(&self, user_id: &str) -> Result<Vec<ProgressRecord>> {
        let docs = query_newest_first(
            self.store.as_ref(),
            self.timeout,
            READING_PROGRESS,
            user_id,
            "lastRead",
        )
        .await?;

        docs.iter().map(decode).collect()
    }
}

fn decode(doc: &Document) -> Result<ProgressRecord> {
    let mut record: ProgressRecord = doc.decode()?;
    record.id = Some(doc.id.clone());
    Ok(record)
}
