//! Catalog API response shapes.
//!
//! Field names are those of the catalog provider and must not change.

use serde::{Deserialize, Serialize};

/// Status value of a successful response.
pub const SUCCESS: &str = "success";

/// Common response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    /// `"success"` or an error status.
    pub status: String,
    /// Error description when the call failed.
    #[serde(default)]
    pub message: String,
    /// Payload. Absent on some failures.
    pub data: Option<T>,
}

/// Category label of a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id.
    #[serde(default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
}

/// One chapter as listed by a mirror server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterData {
    /// File name. Does not reliably follow reading order.
    #[serde(default)]
    pub filename: String,
    /// Chapter number; unique and ordered within a server.
    pub chapter_name: String,
    /// Optional chapter title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_title: Option<String>,
    /// URL of the chapter's page list.
    pub chapter_api_data: String,
}

/// Chapter listing of one mirror server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterServer {
    /// Server label.
    #[serde(default)]
    pub server_name: String,
    /// Chapters as listed by this server.
    #[serde(default)]
    pub server_data: Vec<ChapterData>,
}

/// Full story metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryDetails {
    /// Catalog id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Title.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Alternative titles.
    #[serde(default)]
    pub origin_name: Vec<String>,
    /// Synopsis (HTML).
    #[serde(default)]
    pub content: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: String,
    /// Thumbnail. Relative as received, absolute once fetched through the client.
    #[serde(default)]
    pub thumb_url: String,
    /// Authors.
    #[serde(default)]
    pub author: Vec<String>,
    /// Categories.
    #[serde(default)]
    pub category: Vec<Category>,
    /// Mirror servers.
    #[serde(default)]
    pub chapters: Vec<ChapterServer>,
    /// Last update (as sent by the provider).
    #[serde(default, rename = "updatedAt")]
    pub updated_at: String,
}

/// Page metadata sent alongside listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoOnPage {
    /// Page title.
    #[serde(rename = "titleHead")]
    pub title_head: String,
    /// Page description.
    #[serde(rename = "descriptionHead")]
    pub description_head: String,
    /// Open Graph type.
    pub og_type: String,
    /// Open Graph images.
    pub og_image: Vec<String>,
}

/// Payload of the story detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryDetailData {
    /// The story.
    pub item: StoryDetails,
    /// Image CDN base.
    #[serde(rename = "APP_DOMAIN_CDN_IMAGE", default)]
    pub cdn_image: String,
    /// Page metadata.
    #[serde(rename = "seoOnPage", default)]
    pub seo_on_page: SeoOnPage,
}

/// One page of a chapter.
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterImage {
    /// Page number.
    #[serde(default)]
    pub image_page: u32,
    /// Image file name.
    pub image_file: String,
}

/// Chapter content item.
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterContentItem {
    /// Path of the chapter below the CDN domain.
    pub chapter_path: String,
    /// Pages in reading order.
    #[serde(default)]
    pub chapter_image: Vec<ChapterImage>,
}

/// Payload of a chapter pointer.
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterContentData {
    /// Image CDN domain.
    pub domain_cdn: String,
    /// Chapter content.
    pub item: ChapterContentItem,
}

/// Latest chapter shown in story listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterLatest {
    /// File name.
    #[serde(default)]
    pub filename: String,
    /// Chapter number.
    pub chapter_name: String,
    /// Optional chapter title.
    #[serde(default)]
    pub chapter_title: String,
    /// URL of the chapter's page list.
    #[serde(default)]
    pub chapter_api_data: String,
}

/// Story as shown in search results and category listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySummary {
    /// Catalog id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Title.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Alternative titles.
    #[serde(default, rename = "origin_name")]
    pub origin_name: Vec<String>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: String,
    /// Thumbnail. Absolute once fetched through the client.
    #[serde(default, rename = "thumb_url")]
    pub thumb_url: String,
    /// Categories.
    #[serde(default)]
    pub category: Vec<Category>,
    /// Last update.
    #[serde(default)]
    pub updated_at: String,
    /// Most recent chapters.
    #[serde(default)]
    pub chapters_latest: Vec<ChapterLatest>,
}

/// Paging of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    /// Items across all pages.
    pub total_items: u32,
    /// Items per page.
    pub total_items_per_page: u32,
    /// Current page (1-based).
    pub current_page: u32,
    /// Page links around the current page.
    pub page_ranges: u32,
}

impl Pagination {
    /// Pages in the listing.
    pub fn total_pages(&self) -> u32 {
        if self.total_items_per_page == 0 {
            return 0;
        }
        self.total_items.div_ceil(self.total_items_per_page)
    }
}

/// Listing parameters echoed by the provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// Listing kind.
    pub type_list: String,
    /// Category slug.
    pub slug: String,
    /// Search keyword.
    pub keyword: String,
    /// Paging.
    pub pagination: Option<Pagination>,
}

/// Payload of search and category listings.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryListData {
    /// Stories on this page.
    #[serde(default)]
    pub items: Vec<StorySummary>,
    /// Listing parameters.
    #[serde(default)]
    pub params: ListParams,
    /// Image CDN base.
    #[serde(rename = "APP_DOMAIN_CDN_IMAGE", default)]
    pub cdn_image: String,
    /// Page metadata.
    #[serde(rename = "seoOnPage", default)]
    pub seo_on_page: SeoOnPage,
}

/// A page of stories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPage {
    /// Stories, with absolute thumbnails.
    pub items: Vec<StorySummary>,
    /// Paging, when the provider sent it.
    pub pagination: Option<Pagination>,
}

/// A genre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    /// Genre id.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// URL slug.
    pub slug: String,
    /// Display name.
    pub name: String,
}

/// Payload of the genre listing.
#[derive(Debug, Clone, Deserialize)]
pub struct GenreListData {
    /// All genres.
    #[serde(default)]
    pub items: Vec<Genre>,
}

/// Absolute thumbnail URL.
pub fn thumbnail_url(cdn_image: &str, thumb_url: &str) -> String {
    format!("{}/uploads/comics/{}", cdn_image, thumb_url)
}

/// Absolute page image URL.
pub fn page_url(domain_cdn: &str, chapter_path: &str, image_file: &str) -> String {
    format!("{}/{}/{}", domain_cdn, chapter_path, image_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_detail_envelope() {
        let body = r#"{
            "status": "success",
            "message": "",
            "data": {
                "item": {
                    "_id": "abc",
                    "name": "Story",
                    "slug": "story",
                    "thumb_url": "story.jpg",
                    "category": [{"id": "1", "name": "Action", "slug": "action"}],
                    "chapters": [{
                        "server_name": "Server #1",
                        "server_data": [{
                            "filename": "f1",
                            "chapter_name": "1",
                            "chapter_title": "",
                            "chapter_api_data": "https://cdn/chapter/1"
                        }]
                    }],
                    "updatedAt": "2024-01-01T00:00:00.000Z"
                },
                "APP_DOMAIN_CDN_IMAGE": "https://img",
                "seoOnPage": {"titleHead": "Story"}
            }
        }"#;

        let envelope: ApiEnvelope<StoryDetailData> = serde_json::from_str(body).unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(envelope.status, SUCCESS);
        assert_eq!(data.item.chapters[0].server_data[0].chapter_name, "1");
        assert_eq!(data.seo_on_page.title_head, "Story");
        assert_eq!(
            thumbnail_url(&data.cdn_image, &data.item.thumb_url),
            "https://img/uploads/comics/story.jpg"
        );
    }

    #[test]
    fn test_total_pages() {
        let paging = Pagination {
            total_items: 49,
            total_items_per_page: 24,
            current_page: 1,
            page_ranges: 5,
        };
        assert_eq!(paging.total_pages(), 3);
        assert_eq!(Pagination::default().total_pages(), 0);
    }
}
