//! Chapter lookup over a story's mirror servers.

use super::models::{ChapterData, StoryDetails};

/// Where [`find_chapter`] looks.
#[derive(Debug, Clone, Copy)]
pub enum ChapterSource<'a> {
    /// One server's chapter list.
    List(&'a [ChapterData]),
    /// Every server of the story, in server order.
    Story(&'a StoryDetails),
}

impl<'a> From<&'a [ChapterData]> for ChapterSource<'a> {
    fn from(list: &'a [ChapterData]) -> Self {
        ChapterSource::List(list)
    }
}

impl<'a> From<&'a Vec<ChapterData>> for ChapterSource<'a> {
    fn from(list: &'a Vec<ChapterData>) -> Self {
        ChapterSource::List(list)
    }
}

impl<'a> From<&'a StoryDetails> for ChapterSource<'a> {
    fn from(story: &'a StoryDetails) -> Self {
        ChapterSource::Story(story)
    }
}

/// Direction of travel for [`adjacent_chapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Previous chapter.
    Prev,
    /// Next chapter.
    Next,
}

/// Chapters of the requested server.
///
/// An unknown or missing index falls back to the first server. A story
/// without servers has no chapters.
pub fn get_chapter_list(story: &StoryDetails, server: Option<usize>) -> &[ChapterData] {
    server
        .and_then(|index| story.chapters.get(index))
        .or_else(|| story.chapters.first())
        .map(|s| s.server_data.as_slice())
        .unwrap_or(&[])
}

/// Find a chapter by file name, chapter pointer, or chapter name, in that
/// order of preference.
pub fn find_chapter<'a>(
    source: impl Into<ChapterSource<'a>>,
    identifier: &str,
) -> Option<&'a ChapterData> {
    match source.into() {
        ChapterSource::List(list) => find_in_list(list, identifier),
        ChapterSource::Story(story) => story
            .chapters
            .iter()
            .find_map(|server| find_in_list(&server.server_data, identifier)),
    }
}

fn find_in_list<'a>(list: &'a [ChapterData], identifier: &str) -> Option<&'a ChapterData> {
    list.iter()
        .find(|c| c.filename == identifier)
        .or_else(|| list.iter().find(|c| c.chapter_api_data == identifier))
        .or_else(|| list.iter().find(|c| c.chapter_name == identifier))
}

/// Neighbor of the chapter named `current` in list order.
///
/// Positions are located by `chapter_name`; file names do not follow
/// reading order.
pub fn adjacent_chapter<'a>(
    chapters: &'a [ChapterData],
    current: &str,
    direction: Direction,
) -> Option<&'a ChapterData> {
    let index = chapters.iter().position(|c| c.chapter_name == current)?;

    match direction {
        Direction::Prev => index.checked_sub(1).and_then(|i| chapters.get(i)),
        Direction::Next => chapters.get(index + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::models::ChapterServer;

    fn chapter(name: &str) -> ChapterData {
        ChapterData {
            filename: format!("file-{}", name),
            chapter_name: name.to_string(),
            chapter_title: None,
            chapter_api_data: format!("https://api/chapter/{}", name),
        }
    }

    fn story(servers: &[&[&str]]) -> StoryDetails {
        StoryDetails {
            id: "id".to_string(),
            name: "Story".to_string(),
            slug: "story".to_string(),
            origin_name: Vec::new(),
            content: String::new(),
            status: "ongoing".to_string(),
            thumb_url: String::new(),
            author: Vec::new(),
            category: Vec::new(),
            chapters: servers
                .iter()
                .enumerate()
                .map(|(i, names)| ChapterServer {
                    server_name: format!("Server #{}", i + 1),
                    server_data: names.iter().map(|n| chapter(n)).collect(),
                })
                .collect(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_chapter_list_server_fallback() {
        let details = story(&[&["1", "2"], &["1", "2", "3"]]);

        assert_eq!(get_chapter_list(&details, Some(1)).len(), 3);
        assert_eq!(get_chapter_list(&details, None).len(), 2);
        assert_eq!(get_chapter_list(&details, Some(9)).len(), 2);
        assert!(get_chapter_list(&story(&[]), Some(0)).is_empty());
    }

    #[test]
    fn test_find_prefers_filename() {
        let mut list = vec![chapter("1"), chapter("2")];
        // A chapter name that collides with another chapter's file name.
        list[1].chapter_name = "file-1".to_string();

        assert_eq!(find_chapter(&list, "file-1").unwrap().chapter_name, "1");
    }

    #[test]
    fn test_find_by_pointer_and_name() {
        let list = vec![chapter("1"), chapter("2")];

        let found = find_chapter(&list, "https://api/chapter/2").unwrap();
        assert_eq!(found.chapter_name, "2");
        assert_eq!(find_chapter(&list, "1").unwrap().filename, "file-1");
        assert!(find_chapter(&list, "missing").is_none());
    }

    #[test]
    fn test_find_searches_servers_in_order() {
        let details = story(&[&["1"], &["1", "2"]]);

        let found = find_chapter(&details, "2").unwrap();
        assert_eq!(found.chapter_name, "2");
        assert!(std::ptr::eq(
            find_chapter(&details, "1").unwrap(),
            &details.chapters[0].server_data[0]
        ));
    }

    #[test]
    fn test_adjacent_chapter() {
        let list = vec![chapter("1"), chapter("2"), chapter("3")];

        assert_eq!(
            adjacent_chapter(&list, "2", Direction::Next).unwrap().chapter_name,
            "3"
        );
        assert_eq!(
            adjacent_chapter(&list, "2", Direction::Prev).unwrap().chapter_name,
            "1"
        );
        assert!(adjacent_chapter(&list, "1", Direction::Prev).is_none());
        assert!(adjacent_chapter(&list, "3", Direction::Next).is_none());
        assert!(adjacent_chapter(&list, "9", Direction::Next).is_none());
    }
}
