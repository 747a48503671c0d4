//! Reading logic for novelreader.
//!
//! [`cursor`] pages through a chapter body, [`session`] holds what the host
//! keeps between actions, and [`reader`] ties both to the fetcher and the
//! state file.

pub mod cursor;
pub mod reader;
pub mod session;

pub use cursor::{Cursor, Direction, Segment};
pub use reader::{FetchProgress, ReadOutcome, Reader, SilentProgress};
pub use session::{ChapterBoundary, IdleTracker, Landing, NavigationTicket, ReaderSession, View};
