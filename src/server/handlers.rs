//! HTTP request handlers.

use crate::catalog::{
    ChapterData, ChapterView, Genre, StoryDetails, StoryPage, find_chapter, get_chapter_list,
    resolve_chapter,
};
use crate::error::{AppError, Result};
use crate::library::LibraryEntry;
use crate::models::{
    FavoriteUpdate, ProfileUpdate, ProgressRecord, ProgressUpdate, UserProfile, UserSettings,
    UserStats,
};
use crate::server::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// SERVICE
// ============================================================================

/// Service summary.
#[derive(Serialize)]
pub struct IndexResponse {
    name: &'static str,
    version: &'static str,
    catalog: String,
    loaded_libraries: usize,
}

/// Service summary (JSON).
pub async fn index(State(state): State<AppState>) -> Json<IndexResponse> {
    Json(IndexResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        catalog: state.catalog.base_url().to_string(),
        loaded_libraries: state.loaded_libraries(),
    })
}

// ============================================================================
// CATALOG
// ============================================================================

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    keyword: String,
}

/// Search stories.
pub async fn story_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<StoryPage>> {
    if params.keyword.trim().is_empty() {
        return Err(AppError::InvalidInput("Keyword must not be empty".to_string()));
    }
    Ok(Json(state.catalog.search(params.keyword.trim()).await?))
}

/// List genres.
pub async fn genre_list(State(state): State<AppState>) -> Result<Json<Vec<Genre>>> {
    Ok(Json(state.catalog.genres().await?))
}

/// Page query parameters.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "first_page")]
    page: u32,
}

fn first_page() -> u32 {
    1
}

/// Stories of a genre.
pub async fn genre_stories(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<StoryPage>> {
    Ok(Json(state.catalog.category(&slug, params.page).await?))
}

/// Story metadata.
pub async fn story_details(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<StoryDetails>> {
    Ok(Json(state.catalog.fetch_story_details(&slug).await?))
}

/// Mirror server selection.
#[derive(Debug, Deserialize)]
pub struct ServerParams {
    server: Option<usize>,
}

/// Chapter list of one mirror server.
pub async fn story_chapters(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<ServerParams>,
) -> Result<Json<Vec<ChapterData>>> {
    let story = state.catalog.fetch_story_details(&slug).await?;
    Ok(Json(get_chapter_list(&story, params.server).to_vec()))
}

/// A chapter with its pages and neighbors.
pub async fn story_chapter(
    State(state): State<AppState>,
    Path((slug, chapter)): Path<(String, String)>,
    Query(params): Query<ServerParams>,
) -> Result<Json<ChapterView>> {
    let story = state.catalog.fetch_story_details(&slug).await?;
    let view = resolve_chapter(&state.catalog, story, params.server, Some(&chapter)).await?;
    Ok(Json(view))
}

/// Page image URLs of a chapter.
pub async fn chapter_pages(
    State(state): State<AppState>,
    Path((slug, chapter)): Path<(String, String)>,
) -> Result<Json<Vec<String>>> {
    let story = state.catalog.fetch_story_details(&slug).await?;
    let found = find_chapter(&story, &chapter)
        .ok_or_else(|| AppError::NotFound(format!("Chapter not found: {}", chapter)))?;

    Ok(Json(state.catalog.fetch_pages(&found.chapter_api_data).await?))
}

// ============================================================================
// LIBRARY
// ============================================================================

/// Reading history.
pub async fn user_library(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<LibraryEntry>>> {
    let cache = state.library(&user_id).await?;
    Ok(Json(cache.library_view()))
}

/// Favorites.
pub async fn user_favorites(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<LibraryEntry>>> {
    let cache = state.library(&user_id).await?;
    Ok(Json(cache.favorites_view()))
}

/// Statistics.
pub async fn user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStats>> {
    let cache = state.library(&user_id).await?;
    Ok(Json(cache.stats()))
}

/// Progress on one story.
pub async fn get_progress(
    State(state): State<AppState>,
    Path((user_id, story_id)): Path<(String, String)>,
) -> Result<Json<Option<ProgressRecord>>> {
    let cache = state.library(&user_id).await?;
    Ok(Json(cache.get_progress(&story_id)))
}

/// Record progress on one story.
pub async fn put_progress(
    State(state): State<AppState>,
    Path((user_id, story_id)): Path<(String, String)>,
    Json(update): Json<ProgressUpdate>,
) -> Result<Json<Option<ProgressRecord>>> {
    let cache = state.library(&user_id).await?;
    cache.add_or_update_progress(&story_id, update).await?;
    Ok(Json(cache.get_progress(&story_id)))
}

/// Favorite state of a story.
#[derive(Serialize)]
pub struct FavoriteResponse {
    story_id: String,
    is_favorite: bool,
}

/// Add a story to favorites.
pub async fn put_favorite(
    State(state): State<AppState>,
    Path((user_id, story_id)): Path<(String, String)>,
    Json(update): Json<FavoriteUpdate>,
) -> Result<Json<FavoriteResponse>> {
    let cache = state.library(&user_id).await?;
    cache.add_favorite(&story_id, update).await?;

    Ok(Json(FavoriteResponse {
        is_favorite: cache.is_favorite(&story_id),
        story_id,
    }))
}

/// Remove a story from favorites.
pub async fn delete_favorite(
    State(state): State<AppState>,
    Path((user_id, story_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let cache = state.library(&user_id).await?;
    cache.remove_favorite(&story_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// PROFILE
// ============================================================================

/// Profile of a user.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .profiles
        .get(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile not found: {}", user_id)))?;

    Ok(Json(profile))
}

/// Create or update a profile.
pub async fn put_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>> {
    state.profiles.create_or_update(&user_id, update).await?;
    get_profile(State(state), Path(user_id)).await
}

/// Replace a user's settings.
pub async fn put_settings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(settings): Json<UserSettings>,
) -> Result<StatusCode> {
    state.profiles.update_settings(&user_id, settings).await?;
    Ok(StatusCode::NO_CONTENT)
}
