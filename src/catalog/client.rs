//! HTTP client for the story catalog API.

use super::models::{
    ApiEnvelope, ChapterContentData, Genre, GenreListData, SUCCESS, StoryDetailData, StoryDetails,
    StoryListData, StoryPage, page_url, thumbnail_url,
};
use crate::config::CatalogConfig;
use crate::error::{AppError, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Catalog API client.
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    /// Create a client for `base_url` with a per-request deadline.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from configuration.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.timeout())
    }

    /// API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Story metadata with an absolute thumbnail URL.
    pub async fn fetch_story_details(&self, slug: &str) -> Result<StoryDetails> {
        let url = format!("{}/truyen-tranh/{}", self.base_url, urlencoding::encode(slug));
        let data: StoryDetailData = self.get(&url).await?;

        let mut story = data.item;
        story.thumb_url = thumbnail_url(&data.cdn_image, &story.thumb_url);
        Ok(story)
    }

    /// Page image URLs of a chapter, in reading order.
    ///
    /// `pointer` is the chapter's `chapter_api_data`.
    pub async fn fetch_pages(&self, pointer: &str) -> Result<Vec<String>> {
        let data: ChapterContentData = self.get(pointer).await?;

        let pages: Vec<String> = data
            .item
            .chapter_image
            .iter()
            .map(|img| page_url(&data.domain_cdn, &data.item.chapter_path, &img.image_file))
            .collect();

        tracing::debug!(pointer, pages = pages.len(), "Fetched chapter pages");
        Ok(pages)
    }

    /// Stories matching `keyword`.
    pub async fn search(&self, keyword: &str) -> Result<StoryPage> {
        let url = format!(
            "{}/tim-kiem?keyword={}",
            self.base_url,
            urlencoding::encode(keyword)
        );
        let data: StoryListData = self.get(&url).await?;
        Ok(into_page(data))
    }

    /// All genres.
    pub async fn genres(&self) -> Result<Vec<Genre>> {
        let url = format!("{}/the-loai", self.base_url);
        let data: GenreListData = self.get(&url).await?;
        Ok(data.items)
    }

    /// One page (1-based) of a genre's stories.
    pub async fn category(&self, slug: &str, page: u32) -> Result<StoryPage> {
        let url = format!(
            "{}/the-loai/{}?page={}",
            self.base_url,
            urlencoding::encode(slug),
            page.max(1)
        );
        let data: StoryListData = self.get(&url).await?;
        Ok(into_page(data))
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!(url, "Catalog request");

        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(url.to_string()));
        }

        let envelope: ApiEnvelope<T> = response.error_for_status()?.json().await?;
        if envelope.status != SUCCESS {
            return Err(AppError::ApiStatus {
                status: envelope.status,
                message: envelope.message,
            });
        }

        envelope
            .data
            .ok_or_else(|| AppError::Internal(format!("Catalog response without data: {}", url)))
    }
}

fn into_page(data: StoryListData) -> StoryPage {
    let cdn = data.cdn_image;
    let items = data
        .items
        .into_iter()
        .map(|mut story| {
            if !cdn.is_empty() {
                story.thumb_url = thumbnail_url(&cdn, &story.thumb_url);
            }
            story
        })
        .collect();

    StoryPage {
        items,
        pagination: data.params.pagination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::{Path, Query};
    use axum::routing::get;
    use axum::Json;
    use serde_json::{Value, json};
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn fixture() -> Router {
        Router::new()
            .route(
                "/truyen-tranh/{slug}",
                get(|Path(slug): Path<String>| async move {
                    if slug == "broken" {
                        return Json(json!({ "status": "error", "message": "Story hidden" }));
                    }
                    Json(json!({
                        "status": "success",
                        "data": {
                            "item": { "_id": "1", "name": "Story", "slug": slug, "thumb_url": "s.jpg" },
                            "APP_DOMAIN_CDN_IMAGE": "https://img"
                        }
                    }))
                }),
            )
            .route(
                "/chapter/{id}",
                get(|| async {
                    Json(json!({
                        "status": "success",
                        "data": {
                            "domain_cdn": "https://cdn",
                            "item": {
                                "chapter_path": "uploads/1",
                                "chapter_image": [
                                    { "image_page": 1, "image_file": "a.jpg" },
                                    { "image_page": 2, "image_file": "b.jpg" }
                                ]
                            }
                        }
                    }))
                }),
            )
            .route(
                "/tim-kiem",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let keyword = params.get("keyword").cloned().unwrap_or_default();
                    Json(json!({
                        "status": "success",
                        "data": {
                            "items": [{ "_id": "1", "name": keyword, "slug": "s", "thumb_url": "s.jpg" }],
                            "params": { "pagination": { "totalItems": 1, "totalItemsPerPage": 24, "currentPage": 1 } },
                            "APP_DOMAIN_CDN_IMAGE": "https://img"
                        }
                    }))
                }),
            )
            .route(
                "/the-loai",
                get(|| async {
                    Json(json!({
                        "status": "success",
                        "data": { "items": [{ "_id": "g", "slug": "action", "name": "Action" }] }
                    }))
                }),
            )
            .route(
                "/the-loai/{slug}",
                get(
                    |Path(slug): Path<String>, Query(params): Query<HashMap<String, String>>| async move {
                        let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
                        Json(json!({
                            "status": "success",
                            "data": {
                                "items": [],
                                "params": {
                                    "slug": slug,
                                    "pagination": { "totalItems": 100, "totalItemsPerPage": 24, "currentPage": page }
                                }
                            }
                        }))
                    },
                ),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Json(Value::Null)
                }),
            )
    }

    #[tokio::test]
    async fn test_story_details_absolute_thumbnail() {
        let base = serve(fixture()).await;
        let client = CatalogClient::new(&base, Duration::from_secs(5)).unwrap();

        let story = client.fetch_story_details("my-story").await.unwrap();
        assert_eq!(story.slug, "my-story");
        assert_eq!(story.thumb_url, "https://img/uploads/comics/s.jpg");
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let base = serve(fixture()).await;
        let client = CatalogClient::new(&base, Duration::from_secs(5)).unwrap();

        match client.fetch_story_details("broken").await {
            Err(AppError::ApiStatus { status, message }) => {
                assert_eq!(status, "error");
                assert_eq!(message, "Story hidden");
            }
            other => panic!("expected ApiStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_pages_builds_urls() {
        let base = serve(fixture()).await;
        let client = CatalogClient::new(&base, Duration::from_secs(5)).unwrap();

        let pages = client
            .fetch_pages(&format!("{}/chapter/42", base))
            .await
            .unwrap();
        assert_eq!(
            pages,
            vec!["https://cdn/uploads/1/a.jpg", "https://cdn/uploads/1/b.jpg"]
        );
    }

    #[tokio::test]
    async fn test_search_genres_and_category() {
        let base = serve(fixture()).await;
        let client = CatalogClient::new(&base, Duration::from_secs(5)).unwrap();

        let found = client.search("one piece").await.unwrap();
        assert_eq!(found.items[0].name, "one piece");
        assert_eq!(found.items[0].thumb_url, "https://img/uploads/comics/s.jpg");

        let genres = client.genres().await.unwrap();
        assert_eq!(genres[0].slug, "action");

        let page = client.category("action", 3).await.unwrap();
        let paging = page.pagination.unwrap();
        assert_eq!(paging.current_page, 3);
        assert_eq!(paging.total_pages(), 5);
    }

    #[tokio::test]
    async fn test_missing_route_is_not_found() {
        let base = serve(fixture()).await;
        let client = CatalogClient::new(&base, Duration::from_secs(5)).unwrap();

        let result = client.fetch_pages(&format!("{}/nowhere", base)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_deadline_is_enforced() {
        let base = serve(fixture()).await;
        let client = CatalogClient::new(&base, Duration::from_millis(200)).unwrap();

        let result = client.fetch_pages(&format!("{}/slow", base)).await;
        assert!(matches!(result, Err(AppError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = CatalogClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();

        let err = client.genres().await.unwrap_err();
        assert!(err.is_transport());
    }
}
