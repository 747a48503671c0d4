//! Per-session reading state owned by the host.
//!
//! [`ReaderSession`] bundles what the host needs between user actions: the
//! active chapter, its cursor, the current URL and book name. Chapter loads
//! go through a [`NavigationTicket`] so a slow fetch that resolves after a
//! newer one can be recognised and dropped.

use std::time::{Duration, Instant};

use novelreader_shared::{ChapterRecord, ReaderConfig, UNKNOWN_BOOK};
use tracing::debug;
use url::Url;

use crate::cursor::{Cursor, Direction, Segment};

/// Which end of the book a chapter sits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterBoundary {
    /// No previous chapter link.
    First,
    /// No next chapter link.
    Last,
}

impl ChapterBoundary {
    /// Boundary implied by a record's links.
    ///
    /// Only one missing link counts; a page with neither is an extraction
    /// miss rather than a boundary.
    pub fn of(record: &ChapterRecord) -> Option<Self> {
        match (record.prev_url.is_some(), record.next_url.is_some()) {
            (false, true) => Some(Self::First),
            (true, false) => Some(Self::Last),
            _ => None,
        }
    }

    /// Informational message for the host to display.
    pub fn message(self) -> &'static str {
        match self {
            Self::First => "this is the first chapter",
            Self::Last => "this is the last chapter",
        }
    }
}

/// What the host shows after a cursor change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    /// Visible window and page indicator.
    pub segment: Segment,
    /// Raw chapter numeral (see [`ChapterRecord::chapter_number`]).
    pub chapter_number: String,
    /// Chapter heading.
    pub chapter_title: String,
    /// Active book name.
    pub book_name: String,
    /// Set when a freshly loaded chapter is the first or last one.
    pub boundary: Option<ChapterBoundary>,
}

/// Claim on the next chapter load; only the newest ticket may be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTicket {
    url: Url,
    generation: u64,
}

impl NavigationTicket {
    /// Target of the load.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Where the cursor lands when a fetched chapter is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Landing {
    /// First segment of the chapter.
    Start,
    /// A saved offset, optionally with the shelf's name for the book.
    Restore {
        position: i64,
        book_name: Option<String>,
    },
}

/// Mutable reading session: cursor plus the chapter it pages through.
#[derive(Debug, Clone)]
pub struct ReaderSession {
    cursor: Cursor,
    chapter: Option<ChapterRecord>,
    current_url: Option<Url>,
    book_name: String,
    generation: u64,
    pending: Option<NavigationTicket>,
}

impl ReaderSession {
    /// Empty session.
    pub fn new(config: &ReaderConfig) -> Self {
        Self {
            cursor: Cursor::new(config.segment_size),
            chapter: None,
            current_url: None,
            book_name: UNKNOWN_BOOK.to_string(),
            generation: 0,
            pending: None,
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn chapter(&self) -> Option<&ChapterRecord> {
        self.chapter.as_ref()
    }

    pub fn current_url(&self) -> Option<&Url> {
        self.current_url.as_ref()
    }

    pub fn book_name(&self) -> &str {
        &self.book_name
    }

    /// Whether a chapter load is outstanding.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Start loading `url`; supersedes any load still in flight.
    pub fn begin(&mut self, url: Url) -> NavigationTicket {
        self.generation += 1;
        let ticket = NavigationTicket {
            url,
            generation: self.generation,
        };
        self.pending = Some(ticket.clone());
        debug!(url = %ticket.url, generation = ticket.generation, "navigation started");
        ticket
    }

    /// Apply a fetched chapter. Returns `None` when `ticket` was superseded.
    pub fn apply(
        &mut self,
        ticket: &NavigationTicket,
        record: ChapterRecord,
        landing: Landing,
    ) -> Option<View> {
        if self.pending.as_ref() != Some(ticket) {
            debug!(url = %ticket.url, generation = ticket.generation, "discarding stale chapter");
            return None;
        }
        self.pending = None;

        let segment = match landing {
            Landing::Start => self.cursor.jump_to(&record.body),
            Landing::Restore {
                position,
                book_name,
            } => {
                if let Some(name) = book_name {
                    self.book_name = name;
                }
                self.cursor.jump_to(&record.body);
                self.cursor.seek(position)
            }
        };

        if let Some(title) = &record.book_title {
            self.book_name = title.clone();
        }

        let boundary = ChapterBoundary::of(&record);
        self.current_url = Some(ticket.url.clone());
        self.chapter = Some(record);
        self.view(segment, boundary)
    }

    /// Drop a failed load; the visible chapter stays as it was.
    pub fn abandon(&mut self, ticket: &NavigationTicket) {
        if self.pending.as_ref() == Some(ticket) {
            self.pending = None;
        }
    }

    /// Page forward or backward. `None` when no chapter is loaded.
    pub fn page(&mut self, direction: Direction, is_resuming: bool) -> Option<View> {
        self.chapter.as_ref()?;
        let segment = self.cursor.advance(direction, is_resuming);
        self.view(segment, None)
    }

    /// Re-render the current window without moving.
    pub fn current_view(&self) -> Option<View> {
        self.chapter.as_ref()?;
        self.view(self.cursor.render(), None)
    }

    /// Link to the adjacent chapter, or the boundary that blocks it.
    pub fn adjacent_chapter(&self, direction: Direction) -> Result<Url, ChapterBoundary> {
        let chapter = self.chapter.as_ref();
        match direction {
            Direction::Forward => chapter
                .and_then(|c| c.next_url.clone())
                .ok_or(ChapterBoundary::Last),
            Direction::Backward => chapter
                .and_then(|c| c.prev_url.clone())
                .ok_or(ChapterBoundary::First),
        }
    }

    /// Forget the active book (after it was removed from the shelf).
    pub fn reset(&mut self) {
        self.cursor.reset();
        self.chapter = None;
        self.current_url = None;
        self.book_name.clear();
        self.pending = None;
    }

    fn view(&self, segment: Segment, boundary: Option<ChapterBoundary>) -> Option<View> {
        let chapter = self.chapter.as_ref()?;
        Some(View {
            segment,
            chapter_number: chapter.chapter_number.clone(),
            chapter_title: chapter.title.clone(),
            book_name: self.book_name.clone(),
            boundary,
        })
    }
}

// ---------------------------------------------------------------------------
// Idle tracking
// ---------------------------------------------------------------------------

/// Decides whether a user action follows an idle period.
///
/// The host feeds it timestamps; the first action after `timeout` of
/// inactivity is reported as resuming, which the cursor treats as a
/// refresh-only render.
#[derive(Debug, Clone)]
pub struct IdleTracker {
    timeout: Duration,
    last_activity: Option<Instant>,
}

impl IdleTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_activity: None,
        }
    }

    /// Record an action at `now`; returns `true` if it ends an idle period.
    pub fn touch(&mut self, now: Instant) -> bool {
        let resuming = self
            .last_activity
            .is_some_and(|last| now.saturating_duration_since(last) >= self.timeout);
        self.last_activity = Some(now);
        resuming
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, body_len: usize, prev: Option<&str>, next: Option<&str>) -> ChapterRecord {
        let content = "字".repeat(body_len);
        ChapterRecord {
            source_url: Url::parse(url).unwrap(),
            title: "第一章".into(),
            chapter_number: "一".into(),
            body: ChapterRecord::wrap_body("第一章", &content),
            prev_url: prev.map(|u| Url::parse(u).unwrap()),
            next_url: next.map(|u| Url::parse(u).unwrap()),
            toc_url: None,
            book_title: None,
        }
    }

    fn session() -> ReaderSession {
        ReaderSession::new(&ReaderConfig::default())
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn applying_a_chapter_shows_first_segment() {
        let mut session = session();
        let ticket = session.begin(url("http://x/1.html"));
        assert!(session.is_loading());

        let view = session
            .apply(&ticket, record("http://x/1.html", 100, None, Some("http://x/2.html")), Landing::Start)
            .expect("applied");

        assert!(!session.is_loading());
        assert_eq!(view.segment.start, 0);
        assert_eq!(view.segment.text.chars().count(), 30);
        assert!(view.segment.text.starts_with("【第一章】"));
        assert_eq!(view.boundary, Some(ChapterBoundary::First));
        assert_eq!(view.book_name, UNKNOWN_BOOK);
        assert_eq!(session.current_url().map(Url::as_str), Some("http://x/1.html"));
    }

    #[test]
    fn stale_fetch_is_discarded() {
        let mut session = session();
        let slow = session.begin(url("http://x/1.html"));
        let fast = session.begin(url("http://x/2.html"));

        let mut newer = record("http://x/2.html", 50, None, None);
        newer.title = "第二章".into();
        session.apply(&fast, newer, Landing::Start).expect("newest applies");

        let stale = session.apply(&slow, record("http://x/1.html", 500, None, None), Landing::Start);
        assert!(stale.is_none());
        assert_eq!(session.current_url().map(Url::as_str), Some("http://x/2.html"));
        assert_eq!(session.chapter().unwrap().title, "第二章");
    }

    #[test]
    fn same_url_requested_twice_only_applies_latest() {
        let mut session = session();
        let first = session.begin(url("http://x/1.html"));
        let second = session.begin(url("http://x/1.html"));
        assert_ne!(first, second);

        assert!(session.apply(&first, record("http://x/1.html", 10, None, None), Landing::Start).is_none());
        assert!(session.apply(&second, record("http://x/1.html", 10, None, None), Landing::Start).is_some());
    }

    #[test]
    fn abandoned_load_leaves_state_unchanged() {
        let mut session = session();
        let ticket = session.begin(url("http://x/1.html"));
        session.apply(&ticket, record("http://x/1.html", 90, None, None), Landing::Start);
        session.page(Direction::Forward, false);
        let before = session.cursor().position();

        let failed = session.begin(url("http://x/2.html"));
        session.abandon(&failed);

        assert!(!session.is_loading());
        assert_eq!(session.cursor().position(), before);
        assert_eq!(session.current_url().map(Url::as_str), Some("http://x/1.html"));
    }

    #[test]
    fn restore_landing_seeks_and_names_book() {
        let mut session = session();
        let ticket = session.begin(url("http://x/5.html"));
        let view = session
            .apply(
                &ticket,
                record("http://x/5.html", 200, Some("http://x/4.html"), Some("http://x/6.html")),
                Landing::Restore {
                    position: 90,
                    book_name: Some("青云志".into()),
                },
            )
            .unwrap();

        assert_eq!(session.cursor().position(), 90);
        assert_eq!(view.segment.start, 90);
        assert_eq!(view.book_name, "青云志");
        assert_eq!(view.boundary, None);
    }

    #[test]
    fn record_book_title_overrides_name() {
        let mut session = session();
        let ticket = session.begin(url("http://x/1.html"));
        let mut rec = record("http://x/1.html", 10, None, None);
        rec.book_title = Some("万古神帝".into());
        let view = session
            .apply(&ticket, rec, Landing::Restore { position: 0, book_name: Some("旧名".into()) })
            .unwrap();
        assert_eq!(view.book_name, "万古神帝");
    }

    #[test]
    fn paging_requires_a_chapter() {
        let mut session = session();
        assert!(session.page(Direction::Forward, false).is_none());
        assert!(session.current_view().is_none());
    }

    #[test]
    fn adjacent_chapter_reports_boundaries() {
        let mut session = session();
        assert_eq!(session.adjacent_chapter(Direction::Forward), Err(ChapterBoundary::Last));

        let ticket = session.begin(url("http://x/1.html"));
        session.apply(&ticket, record("http://x/1.html", 10, None, Some("http://x/2.html")), Landing::Start);

        assert_eq!(
            session.adjacent_chapter(Direction::Forward).unwrap().as_str(),
            "http://x/2.html"
        );
        assert_eq!(session.adjacent_chapter(Direction::Backward), Err(ChapterBoundary::First));
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = session();
        let ticket = session.begin(url("http://x/1.html"));
        session.apply(&ticket, record("http://x/1.html", 10, None, None), Landing::Start);

        session.reset();
        assert!(session.current_url().is_none());
        assert!(session.chapter().is_none());
        assert_eq!(session.cursor().position(), -30);
        assert!(session.book_name().is_empty());
    }

    #[test]
    fn boundary_messages() {
        assert_eq!(ChapterBoundary::First.message(), "this is the first chapter");
        assert_eq!(ChapterBoundary::Last.message(), "this is the last chapter");
    }

    #[test]
    fn idle_tracker_flags_first_action_after_timeout() {
        let mut idle = IdleTracker::new(Duration::from_secs(5));
        let t0 = Instant::now();

        assert!(!idle.touch(t0));
        assert!(!idle.touch(t0 + Duration::from_secs(2)));
        assert!(idle.touch(t0 + Duration::from_secs(8)));
        assert!(!idle.touch(t0 + Duration::from_secs(9)));
    }
}
