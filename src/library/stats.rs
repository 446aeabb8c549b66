//! Derived user statistics.

use super::{FavoriteRepository, ProfileRepository, ProgressRepository};
use crate::error::Result;
use crate::models::{ProgressRecord, UserStats};

/// Derives [`UserStats`] from a user's records.
///
/// Statistics are always recomputed from scratch, so they match the
/// records they were computed from.
#[derive(Clone)]
pub struct StatsAggregator {
    progress: ProgressRepository,
    favorites: FavoriteRepository,
    profiles: ProfileRepository,
    minutes_per_chapter: u32,
}

impl StatsAggregator {
    /// Create an aggregator.
    pub fn new(
        progress: ProgressRepository,
        favorites: FavoriteRepository,
        profiles: ProfileRepository,
        minutes_per_chapter: u32,
    ) -> Self {
        Self {
            progress,
            favorites,
            profiles,
            minutes_per_chapter,
        }
    }

    /// Statistics for a set of progress records and a favorite count.
    pub fn compute(&self, progress: &[ProgressRecord], favorite_count: usize) -> UserStats {
        compute_stats(progress, favorite_count, self.minutes_per_chapter)
    }

    /// Rescan the user's records and store the result on their profile.
    pub async fn recompute_and_persist(&self, user_id: &str) -> Result<UserStats> {
        let (progress, favorites) = tokio::try_join!(
            self.progress.query_by_user(user_id),
            self.favorites.query_by_user(user_id)
        )?;

        let stats = self.compute(&progress, favorites.len());
        self.profiles.persist_stats(user_id, stats).await?;

        tracing::debug!(
            user = %user_id,
            stories_read = stats.stories_read,
            completed = stats.completed_stories,
            favorites = stats.favorite_count,
            "Recomputed user stats"
        );
        Ok(stats)
    }
}

/// Pure statistics computation.
pub fn compute_stats(
    progress: &[ProgressRecord],
    favorite_count: usize,
    minutes_per_chapter: u32,
) -> UserStats {
    let stories_read = progress.iter().filter(|p| p.progress > 0).count();
    let completed_stories = progress.iter().filter(|p| p.progress == 100).count();
    let minutes: u64 = progress
        .iter()
        .map(|p| u64::from(p.read_chapters) * u64::from(minutes_per_chapter))
        .sum();

    UserStats {
        stories_read: stories_read as u32,
        favorite_count: favorite_count as u32,
        reading_time_hours: (minutes as f64 / 60.0).round() as u32,
        completed_stories: completed_stories as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(progress: u8, read_chapters: u32) -> ProgressRecord {
        ProgressRecord {
            id: None,
            user_id: "u1".to_string(),
            story_id: format!("s{}", progress),
            story_name: "Story".to_string(),
            story_slug: "story".to_string(),
            story_thumbnail: String::new(),
            progress,
            read_chapters,
            total_chapters: 10,
            last_read: 0,
            rating: None,
            is_favorite: false,
            category: String::new(),
        }
    }

    #[test]
    fn test_counts_read_and_completed() {
        let records = [record(100, 0), record(50, 0), record(0, 0)];
        let stats = compute_stats(&records, 4, 10);

        assert_eq!(stats.stories_read, 2);
        assert_eq!(stats.completed_stories, 1);
        assert_eq!(stats.favorite_count, 4);
    }

    #[test]
    fn test_reading_time_rounds_to_hours() {
        // 9 chapters * 10 min = 90 min -> 1.5h -> 2h
        assert_eq!(compute_stats(&[record(10, 9)], 0, 10).reading_time_hours, 2);
        // 2 chapters * 10 min = 20 min -> 0h
        assert_eq!(compute_stats(&[record(10, 2)], 0, 10).reading_time_hours, 0);
        assert_eq!(
            compute_stats(&[record(10, 6), record(20, 6)], 0, 10).reading_time_hours,
            2
        );
    }

    #[test]
    fn test_empty_library() {
        assert_eq!(compute_stats(&[], 0, 10), UserStats::default());
    }
}
