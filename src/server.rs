//! HTTP server and routes.

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    routing::{get, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let story_routes = Router::new()
        .route("/search", get(handlers::story_search))
        .route("/{slug}", get(handlers::story_details))
        .route("/{slug}/chapters", get(handlers::story_chapters))
        .route("/{slug}/chapters/{chapter}", get(handlers::story_chapter))
        .route(
            "/{slug}/chapters/{chapter}/pages",
            get(handlers::chapter_pages),
        );

    let genre_routes = Router::new()
        .route("/", get(handlers::genre_list))
        .route("/{slug}", get(handlers::genre_stories));

    let user_routes = Router::new()
        .route("/{user}/library", get(handlers::user_library))
        .route("/{user}/favorites", get(handlers::user_favorites))
        .route("/{user}/stats", get(handlers::user_stats))
        .route(
            "/{user}/profile",
            get(handlers::get_profile).put(handlers::put_profile),
        )
        .route("/{user}/settings", put(handlers::put_settings))
        // Progress by story
        .route(
            "/{user}/progress/{story}",
            get(handlers::get_progress).put(handlers::put_progress),
        )
        // Favorite by story
        .route(
            "/{user}/favorites/{story}",
            put(handlers::put_favorite).delete(handlers::delete_favorite),
        );

    Router::new()
        .route("/", get(handlers::index))
        .nest("/api/stories", story_routes)
        .nest("/api/genres", genre_routes)
        .nest("/api/users", user_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
