//! Reading-state persistence.
//!
//! The [`StateStore`] owns a single JSON document holding the active chapter
//! URL, its cursor position, and the most-recent-first bookshelf:
//!
//! ```json
//! { "url": "...", "position": 30,
//!   "bookshelf": [ { "bookname": "...", "chapterurl": "...", "position": 30 } ] }
//! ```
//!
//! **Write rules:**
//! - every mutation rewrites the whole document (temp file + rename)
//! - last write wins; a single user session is assumed, so there is no locking
//! - a missing or unparsable file reads as "no state"

use std::path::{Path, PathBuf};

use novelreader_shared::{BookshelfEntry, NovelReaderError, ReadingState, Result};
use tracing::{debug, info, warn};

/// Handle to the reading-state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Use the state file at `path`. Nothing is touched until the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted state.
    ///
    /// Returns `None` when the file is absent or corrupt; the caller starts
    /// fresh instead of failing.
    pub fn load(&self) -> Option<ReadingState> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "no reading state yet");
                return None;
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "failed to read reading state");
                return None;
            }
        };

        match serde_json::from_str::<ReadingState>(&content) {
            Ok(state) => {
                debug!(
                    url = %state.url,
                    position = state.position,
                    books = state.bookshelf.len(),
                    "loaded reading state"
                );
                Some(state)
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "reading state is corrupt, ignoring");
                None
            }
        }
    }

    /// Persist the live cursor and move `bookname` to the head of the shelf.
    ///
    /// Creates the document on first use. Returns the state as written.
    pub fn save(&self, url: &str, position: i64, bookname: &str) -> Result<ReadingState> {
        let state = match self.load() {
            Some(mut state) => {
                state.record(url, position, bookname);
                state
            }
            None => ReadingState::new(url, position, bookname),
        };

        self.write(&state)?;
        debug!(url, position, bookname, books = state.bookshelf.len(), "saved reading state");
        Ok(state)
    }

    /// Remove the shelf entry matching both `name` and `url`.
    ///
    /// A miss is reported as [`NovelReaderError::BookNotFound`] and leaves the
    /// file untouched.
    pub fn remove_book(&self, name: &str, url: &str) -> Result<BookshelfEntry> {
        let mut state = self
            .load()
            .ok_or_else(|| NovelReaderError::book_not_found(name, url))?;

        let removed = state
            .remove(name, url)
            .ok_or_else(|| NovelReaderError::book_not_found(name, url))?;

        self.write(&state)?;
        info!(bookname = %removed.bookname, url = %removed.chapterurl, "removed book from shelf");
        Ok(removed)
    }

    /// Shelf entries, most recent first (empty when there is no state).
    pub fn bookshelf(&self) -> Vec<BookshelfEntry> {
        self.load().map(|state| state.bookshelf).unwrap_or_default()
    }

    /// Replace the whole document with `state`.
    pub fn write(&self, state: &ReadingState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| NovelReaderError::io(parent, e))?;
        }

        let json = serde_json::to_string(state)
            .map_err(|e| NovelReaderError::Persistence(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| NovelReaderError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| NovelReaderError::io(&self.path, e))?;
        Ok(())
    }
}
