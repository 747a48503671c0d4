//! The reading workflow: fetch → session → persistence.
//!
//! [`Reader`] is what a host drives in response to user actions. Every
//! cursor change is written back to the state file; write failures are
//! logged and otherwise ignored so a read-only disk never blocks reading.

use tracing::{info, instrument, warn};
use url::Url;

use novelreader_extractor::ChapterFetcher;
use novelreader_shared::{BookshelfEntry, NovelReaderError, ReaderConfig, Result};
use novelreader_storage::StateStore;

use crate::cursor::Direction;
use crate::session::{ChapterBoundary, Landing, ReaderSession, View};

/// Result of a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// New window to display.
    Rendered(View),
    /// No adjacent chapter in the requested direction; nothing was fetched.
    Boundary(ChapterBoundary),
    /// A newer navigation superseded this one; its result was dropped.
    Discarded,
    /// No chapter is loaded.
    Empty,
}

/// Fetch progress callbacks for the host (spinners, status lines).
pub trait FetchProgress: Send + Sync {
    /// Called before the request goes out.
    fn started(&self, url: &Url);
    /// Called when the request settles, successfully or not.
    fn finished(&self, url: &Url, ok: bool);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl FetchProgress for SilentProgress {
    fn started(&self, _url: &Url) {}
    fn finished(&self, _url: &Url, _ok: bool) {}
}

/// Session plus its collaborators.
pub struct Reader {
    fetcher: ChapterFetcher,
    store: StateStore,
    session: ReaderSession,
    progress: Box<dyn FetchProgress>,
}

impl Reader {
    pub fn new(fetcher: ChapterFetcher, store: StateStore, config: &ReaderConfig) -> Self {
        Self {
            fetcher,
            store,
            session: ReaderSession::new(config),
            progress: Box::new(SilentProgress),
        }
    }

    /// Report fetches to `progress`.
    pub fn with_progress(mut self, progress: impl FetchProgress + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn session(&self) -> &ReaderSession {
        &self.session
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Load `url` and show its first segment.
    pub async fn open(&mut self, url: Url) -> Result<ReadOutcome> {
        self.load(url, Landing::Start).await
    }

    /// Reopen a shelf entry at its saved position.
    pub async fn open_book(&mut self, entry: &BookshelfEntry) -> Result<ReadOutcome> {
        let url = parse_stored_url(&entry.chapterurl)?;
        self.load(
            url,
            Landing::Restore {
                position: entry.position,
                book_name: Some(entry.bookname.clone()),
            },
        )
        .await
    }

    /// Reload the chapter and position saved by the last session.
    ///
    /// `Ok(None)` when there is nothing to resume.
    pub async fn resume(&mut self) -> Result<Option<ReadOutcome>> {
        let Some(state) = self.store.load() else {
            return Ok(None);
        };
        if state.url.is_empty() {
            return Ok(None);
        }

        let url = parse_stored_url(&state.url)?;
        let book_name = state.find_by_url(&state.url).map(|b| b.bookname.clone());
        info!(url = %url, position = state.position, "resuming last session");

        self.load(
            url,
            Landing::Restore {
                position: state.position,
                book_name,
            },
        )
        .await
        .map(Some)
    }

    /// Follow the next-chapter link.
    pub async fn next_chapter(&mut self) -> Result<ReadOutcome> {
        self.follow(Direction::Forward).await
    }

    /// Follow the previous-chapter link.
    pub async fn prev_chapter(&mut self) -> Result<ReadOutcome> {
        self.follow(Direction::Backward).await
    }

    /// Page forward within the chapter.
    pub fn next_segment(&mut self, is_resuming: bool) -> ReadOutcome {
        self.page(Direction::Forward, is_resuming)
    }

    /// Page backward within the chapter.
    pub fn prev_segment(&mut self, is_resuming: bool) -> ReadOutcome {
        self.page(Direction::Backward, is_resuming)
    }

    /// Current window without moving.
    pub fn current(&self) -> ReadOutcome {
        self.session
            .current_view()
            .map_or(ReadOutcome::Empty, ReadOutcome::Rendered)
    }

    /// Shelf entries, most recent first.
    pub fn bookshelf(&self) -> Vec<BookshelfEntry> {
        self.store.bookshelf()
    }

    /// Remove a shelf entry; resets the session if it was the open chapter.
    pub fn remove_book(&mut self, name: &str, url: &str) -> Result<BookshelfEntry> {
        let removed = self.store.remove_book(name, url)?;

        let is_active = self
            .session
            .current_url()
            .is_some_and(|current| current.as_str() == removed.chapterurl);
        if is_active {
            info!(bookname = %removed.bookname, "removed the open book, resetting session");
            self.session.reset();
        }

        Ok(removed)
    }

    async fn follow(&mut self, direction: Direction) -> Result<ReadOutcome> {
        match self.session.adjacent_chapter(direction) {
            Ok(url) => self.load(url, Landing::Start).await,
            Err(boundary) => Ok(ReadOutcome::Boundary(boundary)),
        }
    }

    fn page(&mut self, direction: Direction, is_resuming: bool) -> ReadOutcome {
        match self.session.page(direction, is_resuming) {
            Some(view) => {
                self.persist();
                ReadOutcome::Rendered(view)
            }
            None => ReadOutcome::Empty,
        }
    }

    #[instrument(skip_all, fields(url = %url))]
    async fn load(&mut self, url: Url, landing: Landing) -> Result<ReadOutcome> {
        let ticket = self.session.begin(url.clone());

        self.progress.started(&url);
        let fetched = self.fetcher.fetch_chapter(&url).await;
        self.progress.finished(&url, fetched.is_ok());

        let record = match fetched {
            Ok(record) => record,
            Err(e) => {
                self.session.abandon(&ticket);
                return Err(e);
            }
        };

        match self.session.apply(&ticket, record, landing) {
            Some(view) => {
                self.persist();
                Ok(ReadOutcome::Rendered(view))
            }
            None => Ok(ReadOutcome::Discarded),
        }
    }

    fn persist(&self) {
        let Some(url) = self.session.current_url() else {
            return;
        };
        let position = self.session.cursor().position();
        if let Err(e) = self.store.save(url.as_str(), position, self.session.book_name()) {
            warn!(error = %e, path = ?self.store.path(), "failed to save reading state");
        }
    }
}

fn parse_stored_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| NovelReaderError::parse(format!("invalid chapter URL {raw:?}: {e}")))
}
