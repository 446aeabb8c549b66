//! Library records as they are stored in the document store.
//!
//! Field names follow the store schema (`camelCase`), so these types
//! serialize straight into and out of documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Collection holding user profiles, keyed by user id.
pub const USERS: &str = "users";
/// Collection holding reading progress records.
pub const READING_PROGRESS: &str = "readingProgress";
/// Collection holding favorite records.
pub const FAVORITES: &str = "favorites";

/// Reading progress of one user on one story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Store-assigned document id.
    #[serde(skip)]
    pub id: Option<String>,
    /// Owning user.
    pub user_id: String,
    /// Story identifier from the catalog.
    pub story_id: String,
    /// Story display name.
    pub story_name: String,
    /// Story slug used by the catalog API.
    pub story_slug: String,
    /// Absolute thumbnail URL.
    pub story_thumbnail: String,
    /// Percent read (0 - 100).
    pub progress: u8,
    /// Chapters read so far.
    pub read_chapters: u32,
    /// Chapters in the story when last read.
    pub total_chapters: u32,
    /// Last read timestamp (milliseconds).
    pub last_read: i64,
    /// Optional rating (0 - 5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// Denormalized favorite flag. Never trusted on read.
    #[serde(default)]
    pub is_favorite: bool,
    /// Single category label.
    #[serde(default)]
    pub category: String,
}

/// A story the user marked as favorite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    /// Store-assigned document id.
    #[serde(skip)]
    pub id: Option<String>,
    /// Owning user.
    pub user_id: String,
    /// Story identifier from the catalog.
    pub story_id: String,
    /// Story display name.
    pub story_name: String,
    /// Story slug used by the catalog API.
    pub story_slug: String,
    /// Absolute thumbnail URL.
    pub story_thumbnail: String,
    /// When the favorite was added (milliseconds).
    pub added_at: i64,
    /// Single category label.
    #[serde(default)]
    pub category: String,
    /// Free-text lifecycle label ("ongoing", "completed", ...).
    #[serde(default)]
    pub status: String,
}

/// Fields supplied when recording reading progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// Story display name.
    pub story_name: String,
    /// Story slug.
    pub story_slug: String,
    /// Absolute thumbnail URL.
    #[serde(default)]
    pub story_thumbnail: String,
    /// Percent read (0 - 100).
    pub progress: u8,
    /// Chapters read so far.
    pub read_chapters: u32,
    /// Chapters in the story.
    pub total_chapters: u32,
    /// Category label.
    #[serde(default)]
    pub category: String,
    /// Optional rating (0 - 5).
    #[serde(default)]
    pub rating: Option<u8>,
}

impl ProgressUpdate {
    /// Reject values outside their documented ranges.
    pub fn validate(&self) -> Result<()> {
        if self.progress > 100 {
            return Err(AppError::InvalidInput(format!(
                "Progress must be between 0 and 100, got {}",
                self.progress
            )));
        }
        match self.rating {
            Some(rating) if rating > 5 => Err(AppError::InvalidInput(format!(
                "Rating must be between 0 and 5, got {}",
                rating
            ))),
            _ => Ok(()),
        }
    }

    /// Build the record stored for `user_id`/`story_id`.
    pub fn into_record(self, user_id: &str, story_id: &str, is_favorite: bool) -> ProgressRecord {
        ProgressRecord {
            id: None,
            user_id: user_id.to_string(),
            story_id: story_id.to_string(),
            story_name: self.story_name,
            story_slug: self.story_slug,
            story_thumbnail: self.story_thumbnail,
            progress: self.progress,
            read_chapters: self.read_chapters,
            total_chapters: self.total_chapters,
            last_read: now_timestamp(),
            rating: self.rating,
            is_favorite,
            category: self.category,
        }
    }
}

/// Fields supplied when adding a favorite.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteUpdate {
    /// Story display name.
    pub story_name: String,
    /// Story slug.
    pub story_slug: String,
    /// Absolute thumbnail URL.
    #[serde(default)]
    pub story_thumbnail: String,
    /// Category label.
    #[serde(default)]
    pub category: String,
    /// Lifecycle label.
    #[serde(default)]
    pub status: String,
}

impl FavoriteUpdate {
    /// Build the record stored for `user_id`/`story_id`.
    pub fn into_record(self, user_id: &str, story_id: &str) -> FavoriteRecord {
        FavoriteRecord {
            id: None,
            user_id: user_id.to_string(),
            story_id: story_id.to_string(),
            story_name: self.story_name,
            story_slug: self.story_slug,
            story_thumbnail: self.story_thumbnail,
            added_at: now_timestamp(),
            category: self.category,
            status: self.status,
        }
    }
}

/// Per-user preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    /// Receive notifications.
    pub notifications: bool,
    /// Dark theme.
    pub dark_mode: bool,
    /// Record progress automatically while reading.
    pub auto_bookmark: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            notifications: true,
            dark_mode: false,
            auto_bookmark: true,
        }
    }
}

/// Summary statistics derived from a user's records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    /// Stories with any progress.
    pub stories_read: u32,
    /// Favorite count.
    pub favorite_count: u32,
    /// Estimated reading time, rounded to whole hours.
    pub reading_time_hours: u32,
    /// Stories read to 100%.
    pub completed_stories: u32,
}

/// User profile document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    /// User id (document id).
    #[serde(skip)]
    pub uid: String,
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Avatar URL.
    #[serde(rename = "photoURL")]
    pub photo_url: String,
    /// Join timestamp (milliseconds).
    pub join_date: i64,
    /// Preferences.
    pub settings: UserSettings,
    /// Cached statistics.
    pub stats: UserStats,
    /// VIP flag.
    pub vip_status: bool,
}

/// Profile fields a user may change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// New email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New avatar URL.
    #[serde(
        default,
        rename = "photoURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_url: Option<String>,
}

/// Current time in milliseconds since the epoch.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a millisecond timestamp to DateTime.
pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts).unwrap_or_else(Utc::now)
}
