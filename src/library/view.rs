//! UI-ready projections of a user's library.

use crate::models::{FavoriteRecord, ProgressRecord};
use serde::Serialize;

/// Status shown for stories known only from reading history.
const DEFAULT_STATUS: &str = "ongoing";
/// Chapter total shown for favorites that were never opened.
const DEFAULT_TOTAL_CHAPTERS: u32 = 100;

/// Category label attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTag {
    /// Tag id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Lowercase slug.
    pub slug: String,
}

impl CategoryTag {
    fn from_label(label: &str) -> Self {
        Self {
            id: "1".to_string(),
            name: label.to_string(),
            slug: label.to_lowercase(),
        }
    }
}

/// A story together with the user's progress on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    /// Story id.
    pub story_id: String,
    /// Story name.
    pub name: String,
    /// Story slug.
    pub slug: String,
    /// Thumbnail URL.
    pub thumbnail: String,
    /// Lifecycle status.
    pub status: String,
    /// Categories.
    pub category: Vec<CategoryTag>,
    /// Percent read.
    pub progress: u8,
    /// Chapters read.
    pub read_chapters: u32,
    /// Chapters total.
    pub total_chapters: u32,
    /// Last read timestamp (milliseconds).
    pub last_read: i64,
    /// Rating (0 when unrated).
    pub rating: u8,
    /// Whether the story is in the favorite set.
    pub is_favorite: bool,
}

/// Reading history entries, in history order.
///
/// Favorite-ness comes from the favorite records, not from the flag stored
/// on the progress record.
pub fn library_entries(
    progress: &[ProgressRecord],
    favorites: &[FavoriteRecord],
) -> Vec<LibraryEntry> {
    progress
        .iter()
        .map(|item| LibraryEntry {
            story_id: item.story_id.clone(),
            name: item.story_name.clone(),
            slug: item.story_slug.clone(),
            thumbnail: item.story_thumbnail.clone(),
            status: DEFAULT_STATUS.to_string(),
            category: vec![CategoryTag::from_label(&item.category)],
            progress: item.progress,
            read_chapters: item.read_chapters,
            total_chapters: item.total_chapters,
            last_read: item.last_read,
            rating: item.rating.unwrap_or(0),
            is_favorite: favorites.iter().any(|f| f.story_id == item.story_id),
        })
        .collect()
}

/// Favorite entries merged with any reading progress, in favorite order.
pub fn favorite_entries(
    progress: &[ProgressRecord],
    favorites: &[FavoriteRecord],
) -> Vec<LibraryEntry> {
    favorites
        .iter()
        .map(|item| {
            let read = progress.iter().find(|p| p.story_id == item.story_id);
            LibraryEntry {
                story_id: item.story_id.clone(),
                name: item.story_name.clone(),
                slug: item.story_slug.clone(),
                thumbnail: item.story_thumbnail.clone(),
                status: item.status.clone(),
                category: vec![CategoryTag::from_label(&item.category)],
                progress: read.map(|p| p.progress).unwrap_or(0),
                read_chapters: read.map(|p| p.read_chapters).unwrap_or(0),
                total_chapters: read
                    .map(|p| p.total_chapters)
                    .unwrap_or(DEFAULT_TOTAL_CHAPTERS),
                last_read: read.map(|p| p.last_read).unwrap_or(item.added_at),
                rating: read.and_then(|p| p.rating).unwrap_or(0),
                is_favorite: true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(story: &str, flag: bool) -> ProgressRecord {
        ProgressRecord {
            id: None,
            user_id: "u1".to_string(),
            story_id: story.to_string(),
            story_name: story.to_uppercase(),
            story_slug: story.to_string(),
            story_thumbnail: String::new(),
            progress: 40,
            read_chapters: 4,
            total_chapters: 10,
            last_read: 7,
            rating: Some(4),
            is_favorite: flag,
            category: "Action".to_string(),
        }
    }

    fn favorite(story: &str) -> FavoriteRecord {
        FavoriteRecord {
            id: None,
            user_id: "u1".to_string(),
            story_id: story.to_string(),
            story_name: story.to_uppercase(),
            story_slug: story.to_string(),
            story_thumbnail: String::new(),
            added_at: 3,
            category: "Drama".to_string(),
            status: "completed".to_string(),
        }
    }

    #[test]
    fn test_favorite_flag_ignores_stored_flag() {
        let entries = library_entries(&[progress("a", true), progress("b", false)], &[favorite("b")]);
        assert!(!entries[0].is_favorite);
        assert!(entries[1].is_favorite);
        assert_eq!(entries[0].status, "ongoing");
        assert_eq!(entries[0].category[0].slug, "action");
    }

    #[test]
    fn test_favorites_merge_progress_and_defaults() {
        let entries = favorite_entries(&[progress("a", false)], &[favorite("a"), favorite("z")]);

        assert_eq!(entries[0].progress, 40);
        assert_eq!(entries[0].rating, 4);
        assert_eq!(entries[0].last_read, 7);

        assert_eq!(entries[1].progress, 0);
        assert_eq!(entries[1].total_chapters, 100);
        assert_eq!(entries[1].last_read, 3);
        assert_eq!(entries[1].status, "completed");
        assert!(entries[1].is_favorite);
    }
}
