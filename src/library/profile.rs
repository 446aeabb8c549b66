//! User profile documents (`users/{userId}`).

use crate::error::Result;
use crate::models::{ProfileUpdate, USERS, UserProfile, UserSettings, UserStats, now_timestamp};
use crate::store::{DocumentStore, with_timeout};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Reads and writes [`UserProfile`]s.
#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl ProfileRepository {
    /// Create a repository over `store`.
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Apply `update` to the profile, creating it with defaults first if
    /// the user has none yet.
    pub async fn create_or_update(&self, user_id: &str, update: ProfileUpdate) -> Result<()> {
        let existing = with_timeout(self.timeout, "get profile", self.store.get(USERS, user_id))
            .await?;

        let mut fields = serde_json::to_value(&update)?;

        if existing.is_some() {
            fields["updatedAt"] = json!(now_timestamp());
            with_timeout(
                self.timeout,
                "update profile",
                self.store.update(USERS, user_id, fields),
            )
            .await?;
        } else {
            let mut profile = serde_json::to_value(UserProfile {
                join_date: now_timestamp(),
                ..UserProfile::default()
            })?;
            crate::store::merge_fields(&mut profile, fields);
            profile["createdAt"] = json!(now_timestamp());
            profile["updatedAt"] = json!(now_timestamp());

            with_timeout(
                self.timeout,
                "create profile",
                self.store.set(USERS, user_id, profile),
            )
            .await?;
            tracing::info!(user = %user_id, "Created user profile");
        }

        Ok(())
    }

    /// Profile of `user_id`, if one exists.
    pub async fn get(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let doc = with_timeout(self.timeout, "get profile", self.store.get(USERS, user_id))
            .await?;

        doc.map(|doc| {
            let mut profile: UserProfile = doc.decode()?;
            profile.uid = doc.id;
            Ok(profile)
        })
        .transpose()
    }

    /// Replace the user's settings.
    pub async fn update_settings(&self, user_id: &str, settings: UserSettings) -> Result<()> {
        with_timeout(
            self.timeout,
            "update settings",
            self.store.update(
                USERS,
                user_id,
                json!({ "settings": settings, "updatedAt": now_timestamp() }),
            ),
        )
        .await
    }

    /// Change the user's avatar.
    pub async fn update_avatar(&self, user_id: &str, photo_url: &str) -> Result<()> {
        with_timeout(
            self.timeout,
            "update avatar",
            self.store.update(
                USERS,
                user_id,
                json!({ "photoURL": photo_url, "updatedAt": now_timestamp() }),
            ),
        )
        .await
    }

    /// Write cached statistics onto the profile, creating the document if
    /// needed.
    pub async fn persist_stats(&self, user_id: &str, stats: UserStats) -> Result<()> {
        with_timeout(
            self.timeout,
            "persist stats",
            self.store.merge(
                USERS,
                user_id,
                json!({ "stats": stats, "updatedAt": now_timestamp() }),
            ),
        )
        .await
    }
}
