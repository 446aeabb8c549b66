//! Chapter reader session.
//!
//! Opening a story or moving to another chapter starts a new fetch. Only
//! the most recent one is applied; anything it supersedes resolves to
//! [`ReaderOutcome::Stale`].

use super::chapters::{Direction, adjacent_chapter, find_chapter, get_chapter_list};
use super::client::CatalogClient;
use super::models::{ChapterData, StoryDetails};
use crate::error::{AppError, Result};
use crate::guard::Generation;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// A chapter ready to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterView {
    /// Story metadata.
    pub story: StoryDetails,
    /// Mirror server index in use.
    pub server: usize,
    /// Displayed chapter.
    pub chapter: ChapterData,
    /// Page image URLs.
    pub pages: Vec<String>,
    /// Previous chapter, if any.
    pub prev: Option<ChapterData>,
    /// Next chapter, if any.
    pub next: Option<ChapterData>,
}

/// Result of a reader fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderOutcome {
    /// The fetch was the latest one and is now displayed.
    Applied(Box<ChapterView>),
    /// A newer fetch started in the meantime; the result was dropped.
    Stale,
}

/// Resolve a chapter of `story` into a view.
///
/// `identifier` may be a file name, a chapter pointer, or a chapter name.
/// Without one the first chapter of the server is used.
pub async fn resolve_chapter(
    client: &CatalogClient,
    story: StoryDetails,
    server: Option<usize>,
    identifier: Option<&str>,
) -> Result<ChapterView> {
    let chapters = get_chapter_list(&story, server);

    let chapter = match identifier {
        Some(id) => find_chapter(chapters, id)
            .or_else(|| find_chapter(&story, id))
            .ok_or_else(|| AppError::NotFound(format!("Chapter not found: {}", id)))?,
        None => chapters
            .first()
            .ok_or_else(|| AppError::NotFound(format!("Story has no chapters: {}", story.slug)))?,
    }
    .clone();

    chapter_view(client, story, server, chapter).await
}

/// Build the view of a chapter already picked from `story`.
async fn chapter_view(
    client: &CatalogClient,
    story: StoryDetails,
    server: Option<usize>,
    chapter: ChapterData,
) -> Result<ChapterView> {
    let chapters = get_chapter_list(&story, server);
    let pages = client.fetch_pages(&chapter.chapter_api_data).await?;
    let prev = adjacent_chapter(chapters, &chapter.chapter_name, Direction::Prev).cloned();
    let next = adjacent_chapter(chapters, &chapter.chapter_name, Direction::Next).cloned();
    let server = server
        .filter(|i| *i < story.chapters.len())
        .unwrap_or(0);

    Ok(ChapterView {
        story,
        server,
        chapter,
        pages,
        prev,
        next,
    })
}

/// One reader's position in the catalog.
pub struct ReaderSession {
    client: CatalogClient,
    generation: Generation,
    current: Arc<RwLock<Option<ChapterView>>>,
}

impl ReaderSession {
    /// New session with nothing open.
    pub fn new(client: CatalogClient) -> Self {
        Self {
            client,
            generation: Generation::new(),
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Open a story at `chapter`, or at its first chapter.
    pub async fn open(
        &self,
        slug: &str,
        server: Option<usize>,
        chapter: Option<&str>,
    ) -> Result<ReaderOutcome> {
        let ticket = self.generation.advance();

        let story = self.client.fetch_story_details(slug).await?;
        if !ticket.is_current() {
            return Ok(ReaderOutcome::Stale);
        }

        let view = resolve_chapter(&self.client, story, server, chapter).await?;
        if !ticket.is_current() {
            tracing::debug!(slug, "Discarding superseded chapter");
            return Ok(ReaderOutcome::Stale);
        }

        *self.current.write() = Some(view.clone());
        Ok(ReaderOutcome::Applied(Box::new(view)))
    }

    /// Move to the neighboring chapter.
    ///
    /// Returns `Ok(None)` at either end of the list or when nothing is open.
    pub async fn navigate(&self, direction: Direction) -> Result<Option<ReaderOutcome>> {
        let Some((story, server, target)) = self.neighbor(direction) else {
            return Ok(None);
        };

        let ticket = self.generation.advance();
        let view = chapter_view(&self.client, story, Some(server), target).await?;
        if !ticket.is_current() {
            return Ok(Some(ReaderOutcome::Stale));
        }

        *self.current.write() = Some(view.clone());
        Ok(Some(ReaderOutcome::Applied(Box::new(view))))
    }

    /// Displayed chapter.
    pub fn current(&self) -> Option<ChapterView> {
        self.current.read().clone()
    }

    fn neighbor(&self, direction: Direction) -> Option<(StoryDetails, usize, ChapterData)> {
        let current = self.current.read();
        let view = current.as_ref()?;
        let target = match direction {
            Direction::Prev => view.prev.clone(),
            Direction::Next => view.next.clone(),
        }?;
        Some((view.story.clone(), view.server, target))
    }
}
