//! Per-session working copy of a user's library.
//!
//! Mutations go to the store first and are only visible here after the
//! affected records have been re-fetched, so a view read after a mutation
//! returns reflects that mutation.

use super::view::{LibraryEntry, favorite_entries, library_entries};
use super::{FavoriteRepository, KeyedLocks, ProfileRepository, ProgressRepository, StatsAggregator};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::guard::Generation;
use crate::models::{FavoriteRecord, FavoriteUpdate, ProgressRecord, ProgressUpdate, UserStats};
use crate::session::Subscription;
use crate::store::DocumentStore;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Library state published to consumers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibrarySnapshot {
    /// Bound user, if any.
    pub user_id: Option<String>,
    /// Reading history, most recent first.
    pub progress: Vec<ProgressRecord>,
    /// Favorites, most recently added first.
    pub favorites: Vec<FavoriteRecord>,
}

impl LibrarySnapshot {
    fn for_user(user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            ..Self::default()
        }
    }

    /// Whether the story is in the favorite set.
    pub fn is_favorite(&self, story_id: &str) -> bool {
        self.favorites.iter().any(|f| f.story_id == story_id)
    }

    /// Progress record for the story.
    pub fn progress_for(&self, story_id: &str) -> Option<&ProgressRecord> {
        self.progress.iter().find(|p| p.story_id == story_id)
    }
}

#[derive(Debug)]
struct Notice {
    message: String,
    raised_at: Instant,
}

/// In-memory cache of one user's progress and favorites.
pub struct LibraryStateCache {
    progress: ProgressRepository,
    favorites: FavoriteRepository,
    stats: StatsAggregator,
    generation: Generation,
    state: watch::Sender<Arc<LibrarySnapshot>>,
    notice: Mutex<Option<Notice>>,
    notice_ttl: Duration,
}

impl LibraryStateCache {
    /// Build a cache and its repositories over `store`.
    pub fn new(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        let timeout = config.store.timeout();
        let locks = KeyedLocks::new();
        let progress = ProgressRepository::new(store.clone(), locks.clone(), timeout);
        let favorites = FavoriteRepository::new(store.clone(), locks, timeout);
        let profiles = ProfileRepository::new(store, timeout);
        let stats = StatsAggregator::new(
            progress.clone(),
            favorites.clone(),
            profiles,
            config.library.minutes_per_chapter,
        );

        Self::from_parts(
            progress,
            favorites,
            stats,
            Duration::from_secs(config.library.notice_seconds),
        )
    }

    /// Build a cache from existing repositories.
    pub fn from_parts(
        progress: ProgressRepository,
        favorites: FavoriteRepository,
        stats: StatsAggregator,
        notice_ttl: Duration,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(LibrarySnapshot::default()));
        Self {
            progress,
            favorites,
            stats,
            generation: Generation::new(),
            state,
            notice: Mutex::new(None),
            notice_ttl,
        }
    }

    /// Bind `user_id` and replace the cache with their records.
    ///
    /// `None` clears the cache without touching the store. If another load
    /// starts before this one finishes, this one's result is discarded.
    pub async fn load(&self, user_id: Option<&str>) -> Result<()> {
        let ticket = self.generation.advance();

        let Some(user_id) = user_id else {
            self.publish(LibrarySnapshot::default());
            return Ok(());
        };

        if self.user_id().as_deref() != Some(user_id) {
            self.publish(LibrarySnapshot::for_user(user_id));
        }

        let fetched = tokio::try_join!(
            self.progress.query_by_user(user_id),
            self.favorites.query_by_user(user_id)
        );
        if !ticket.is_current() {
            tracing::debug!(user = %user_id, "Discarding superseded library load");
            return Ok(());
        }
        let (progress, favorites) = self.track(fetched)?;

        tracing::debug!(
            user = %user_id,
            progress = progress.len(),
            favorites = favorites.len(),
            "Loaded library"
        );

        self.publish(LibrarySnapshot {
            user_id: Some(user_id.to_string()),
            progress,
            favorites,
        });
        Ok(())
    }

    /// Reload the bound user's records. Does nothing when nobody is bound.
    pub async fn refresh(&self) -> Result<()> {
        match self.user_id() {
            Some(user_id) => self.load(Some(&user_id)).await,
            None => Ok(()),
        }
    }

    /// Record reading progress for a story of the bound user.
    pub async fn add_or_update_progress(&self, story_id: &str, update: ProgressUpdate) -> Result<()> {
        self.track(update.validate())?;
        let user_id = self.require_user()?;

        let record = update.into_record(&user_id, story_id, self.is_favorite(story_id));
        self.track(self.progress.upsert(record).await)?;
        self.track(self.stats.recompute_and_persist(&user_id).await)?;
        self.track(self.refresh_progress(&user_id).await)
    }

    /// Mark a story as favorite. A story already in the set is left as is.
    pub async fn add_favorite(&self, story_id: &str, update: FavoriteUpdate) -> Result<()> {
        let user_id = self.require_user()?;

        let record = update.into_record(&user_id, story_id);
        if self.track(self.favorites.add(record).await)? {
            self.track(self.stats.recompute_and_persist(&user_id).await)?;
        }
        self.track(self.refresh_favorites(&user_id).await)
    }

    /// Remove a story from the favorite set.
    pub async fn remove_favorite(&self, story_id: &str) -> Result<()> {
        let user_id = self.require_user()?;

        if self.track(self.favorites.remove(&user_id, story_id).await)? {
            self.track(self.stats.recompute_and_persist(&user_id).await)?;
        }
        self.track(self.refresh_favorites(&user_id).await)
    }

    /// Whether the story is a favorite, as of the last refresh.
    pub fn is_favorite(&self, story_id: &str) -> bool {
        self.state.borrow().is_favorite(story_id)
    }

    /// Progress on the story, as of the last refresh.
    pub fn get_progress(&self, story_id: &str) -> Option<ProgressRecord> {
        self.state.borrow().progress_for(story_id).cloned()
    }

    /// Reading history with favorite flags.
    pub fn library_view(&self) -> Vec<LibraryEntry> {
        let state = self.snapshot();
        library_entries(&state.progress, &state.favorites)
    }

    /// Favorites with reading progress.
    pub fn favorites_view(&self) -> Vec<LibraryEntry> {
        let state = self.snapshot();
        favorite_entries(&state.progress, &state.favorites)
    }

    /// Statistics computed from the cached records.
    pub fn stats(&self) -> UserStats {
        let state = self.snapshot();
        self.stats.compute(&state.progress, state.favorites.len())
    }

    /// Bound user.
    pub fn user_id(&self) -> Option<String> {
        self.state.borrow().user_id.clone()
    }

    /// Current state.
    pub fn snapshot(&self) -> Arc<LibrarySnapshot> {
        self.state.borrow().clone()
    }

    /// Receive every republished state.
    pub fn subscribe(&self) -> watch::Receiver<Arc<LibrarySnapshot>> {
        self.state.subscribe()
    }

    /// Reload whenever the signed-in user changes.
    pub fn follow(self: &Arc<Self>, mut session: watch::Receiver<Option<String>>) -> Subscription {
        let cache = Arc::clone(self);

        Subscription::new(tokio::spawn(async move {
            loop {
                let user_id = session.borrow_and_update().clone();
                if let Err(e) = cache.load(user_id.as_deref()).await {
                    tracing::warn!(error = %e, "Failed to load library for session");
                }

                if session.changed().await.is_err() {
                    break;
                }
            }
        }))
    }

    /// Latest error message, until it expires or is dismissed.
    pub fn notice(&self) -> Option<String> {
        let mut notice = self.notice.lock();
        match notice.as_ref() {
            Some(n) if n.raised_at.elapsed() < self.notice_ttl => Some(n.message.clone()),
            Some(_) => {
                *notice = None;
                None
            }
            None => None,
        }
    }

    /// Dismiss the current error message.
    pub fn clear_notice(&self) {
        *self.notice.lock() = None;
    }

    async fn refresh_progress(&self, user_id: &str) -> Result<()> {
        let ticket = self.generation.ticket();
        let progress = self.progress.query_by_user(user_id).await?;

        if ticket.is_current() && self.user_id().as_deref() == Some(user_id) {
            self.state.send_modify(|state| {
                Arc::make_mut(state).progress = progress;
            });
        }
        Ok(())
    }

    async fn refresh_favorites(&self, user_id: &str) -> Result<()> {
        let ticket = self.generation.ticket();
        let favorites = self.favorites.query_by_user(user_id).await?;

        if ticket.is_current() && self.user_id().as_deref() == Some(user_id) {
            self.state.send_modify(|state| {
                Arc::make_mut(state).favorites = favorites;
            });
        }
        Ok(())
    }

    fn require_user(&self) -> Result<String> {
        self.track(self.user_id().ok_or(AppError::Unauthenticated))
    }

    fn publish(&self, snapshot: LibrarySnapshot) {
        self.state.send_replace(Arc::new(snapshot));
    }

    fn track<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Library operation failed");
            *self.notice.lock() = Some(Notice {
                message: e.user_message(),
                raised_at: Instant::now(),
            });
        }
        result
    }
}
