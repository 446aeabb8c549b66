//! Application state shared across handlers.

use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::error::Result;
use crate::library::{
    FavoriteRepository, KeyedLocks, LibraryStateCache, ProfileRepository, ProgressRepository,
    StatsAggregator,
};
use crate::store::DocumentStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Catalog API client.
    pub catalog: CatalogClient,
    /// Profile documents.
    pub profiles: ProfileRepository,
    progress: ProgressRepository,
    favorites: FavoriteRepository,
    stats: StatsAggregator,
    /// Loaded library caches, one per user.
    caches: Arc<parking_lot::Mutex<HashMap<String, CachedLibrary>>>,
}

struct CachedLibrary {
    cache: Arc<LibraryStateCache>,
    last_used: Instant,
}

impl AppState {
    /// Create state over a document store.
    pub fn new(config: Config, store: Arc<dyn DocumentStore>, catalog: CatalogClient) -> Self {
        let timeout = config.store.timeout();
        let locks = KeyedLocks::new();
        let progress = ProgressRepository::new(store.clone(), locks.clone(), timeout);
        let favorites = FavoriteRepository::new(store.clone(), locks, timeout);
        let profiles = ProfileRepository::new(store, timeout);
        let stats = StatsAggregator::new(
            progress.clone(),
            favorites.clone(),
            profiles.clone(),
            config.library.minutes_per_chapter,
        );

        Self {
            config: Arc::new(config),
            catalog,
            profiles,
            progress,
            favorites,
            stats,
            caches: Arc::new(parking_lot::Mutex::new(HashMap::new())),
        }
    }

    /// Library cache of `user_id`, loading it on first use.
    ///
    /// At most `server.max_cached_libraries` caches are kept. Beyond that
    /// the least recently used caches not held by a request are dropped.
    pub async fn library(&self, user_id: &str) -> Result<Arc<LibraryStateCache>> {
        if let Some(entry) = self.caches.lock().get_mut(user_id) {
            entry.last_used = Instant::now();
            return Ok(entry.cache.clone());
        }

        let cache = Arc::new(LibraryStateCache::from_parts(
            self.progress.clone(),
            self.favorites.clone(),
            self.stats.clone(),
            Duration::from_secs(self.config.library.notice_seconds),
        ));
        cache.load(Some(user_id)).await?;

        let mut caches = self.caches.lock();
        let cache = caches
            .entry(user_id.to_string())
            .or_insert(CachedLibrary {
                cache,
                last_used: Instant::now(),
            })
            .cache
            .clone();
        let evicted = evict_idle(&mut caches, self.config.server.max_cached_libraries);
        tracing::debug!(
            user = %user_id,
            loaded = caches.len(),
            evicted,
            "Library cache ready"
        );
        Ok(cache)
    }

    /// Number of loaded library caches.
    pub fn loaded_libraries(&self) -> usize {
        self.caches.lock().len()
    }
}

/// Drop least recently used caches nobody else holds until `limit` remain.
fn evict_idle(caches: &mut HashMap<String, CachedLibrary>, limit: usize) -> usize {
    let mut evicted = 0;
    while caches.len() > limit {
        let oldest = caches
            .iter()
            .filter(|(_, entry)| Arc::strong_count(&entry.cache) == 1)
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(user, _)| user.clone());

        let Some(user) = oldest else {
            break;
        };
        caches.remove(&user);
        evicted += 1;
    }
    evicted
}
