//! Core domain types: extracted chapters and the persisted reading state.

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// Title used when a page has no heading.
pub const UNKNOWN_CHAPTER: &str = "未知章节";

/// Chapter number used when the title carries no `第…章` marker.
pub const UNKNOWN_CHAPTER_NUMBER: &str = "未知章节号";

/// Book name used until a table-of-contents link reveals the real one.
pub const UNKNOWN_BOOK: &str = "未知书籍";

// ---------------------------------------------------------------------------
// ChapterRecord
// ---------------------------------------------------------------------------

/// Everything extracted from one chapter page.
///
/// `body` always carries the `【title】…【title】` wrapper, even when no
/// content block was found, so offset arithmetic never special-cases a miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    /// Page the record was extracted from.
    pub source_url: Url,
    /// Heading text, or [`UNKNOWN_CHAPTER`].
    pub title: String,
    /// Raw numeral captured from the title (digits or CJK numerals), or
    /// [`UNKNOWN_CHAPTER_NUMBER`].
    pub chapter_number: String,
    /// Delimiter-wrapped, whitespace-collapsed chapter text.
    pub body: String,
    /// Previous chapter link, absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_url: Option<Url>,
    /// Next chapter link, absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<Url>,
    /// Table-of-contents link, absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toc_url: Option<Url>,
    /// Book name recovered from the anchor sharing the TOC href.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_title: Option<String>,
}

impl ChapterRecord {
    /// Build the `【title】content【title】` body.
    pub fn wrap_body(title: &str, content: &str) -> String {
        format!("【{title}】{content}【{title}】")
    }

    /// No previous link: the reader is at the start of the book.
    pub fn is_first_chapter(&self) -> bool {
        self.prev_url.is_none()
    }

    /// No next link: the reader is at the newest chapter.
    pub fn is_last_chapter(&self) -> bool {
        self.next_url.is_none()
    }
}

// ---------------------------------------------------------------------------
// Bookshelf / ReadingState
// ---------------------------------------------------------------------------

/// One remembered book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookshelfEntry {
    /// Unique key within the shelf.
    pub bookname: String,
    /// Last chapter URL read in this book.
    pub chapterurl: String,
    /// Cursor offset inside that chapter.
    #[serde(default)]
    pub position: i64,
}

impl BookshelfEntry {
    pub fn new(bookname: impl Into<String>, chapterurl: impl Into<String>, position: i64) -> Self {
        Self {
            bookname: bookname.into(),
            chapterurl: chapterurl.into(),
            position,
        }
    }
}

/// The persisted document: active cursor plus the most-recent-first shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingState {
    /// URL of the last active chapter.
    pub url: String,
    /// Cursor offset in that chapter.
    pub position: i64,
    /// Remembered books, most recently active first.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bookshelf: Vec<BookshelfEntry>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<BookshelfEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<BookshelfEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ReadingState {
    /// Fresh document with a single-book shelf.
    pub fn new(url: impl Into<String>, position: i64, bookname: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            bookshelf: vec![BookshelfEntry::new(bookname, url.clone(), position)],
            url,
            position,
        }
    }

    /// Record the live cursor: update the top-level fields and move
    /// `bookname` to the head of the shelf.
    pub fn record(&mut self, url: &str, position: i64, bookname: &str) {
        self.url = url.to_string();
        self.position = position;
        self.upsert(BookshelfEntry::new(bookname, url, position));
    }

    /// Insert `entry` at the front, replacing any entry with the same name.
    pub fn upsert(&mut self, entry: BookshelfEntry) {
        self.bookshelf.retain(|book| book.bookname != entry.bookname);
        self.bookshelf.insert(0, entry);
    }

    /// Remove the entry matching both `name` and `url`.
    pub fn remove(&mut self, name: &str, url: &str) -> Option<BookshelfEntry> {
        let index = self
            .bookshelf
            .iter()
            .position(|book| book.bookname == name && book.chapterurl == url)?;
        Some(self.bookshelf.remove(index))
    }

    /// Look up a shelf entry by book name.
    pub fn find(&self, name: &str) -> Option<&BookshelfEntry> {
        self.bookshelf.iter().find(|book| book.bookname == name)
    }

    /// Look up the shelf entry whose chapter URL is `url`.
    pub fn find_by_url(&self, url: &str) -> Option<&BookshelfEntry> {
        self.bookshelf.iter().find(|book| book.chapterurl == url)
    }
}
