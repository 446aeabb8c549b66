//! Story catalog: API client, chapter resolution and the reader session.

pub mod chapters;
pub mod client;
pub mod models;
pub mod reader;

pub use chapters::{ChapterSource, Direction, adjacent_chapter, find_chapter, get_chapter_list};
pub use client::CatalogClient;
pub use models::{ChapterData, ChapterServer, Genre, StoryDetails, StoryPage, StorySummary};
pub use reader::{ChapterView, ReaderOutcome, ReaderSession, resolve_chapter};
