//! Paging cursor over a chapter body.
//!
//! The cursor holds a signed `position` into the text. `-segment_size` means
//! "just loaded": the first forward step lands on offset 0. Rendering, not
//! the arithmetic, keeps the visible window inside the text, so the tail
//! segment is always full width.

use tracing::trace;

/// Paging direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// One rendered window of the chapter text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Visible characters.
    pub text: String,
    /// Window start (inclusive), in characters.
    pub start: usize,
    /// Window end (exclusive), in characters.
    pub end: usize,
    /// Zero-based page index derived from the cursor position.
    pub page: usize,
    /// Page count of the chapter.
    pub pages: usize,
}

impl Segment {
    /// `page/pages`, e.g. `2/3`.
    pub fn page_label(&self) -> String {
        format!("{}/{}", self.page, self.pages)
    }
}

/// Cursor state: `(text, position, segment_size)`.
#[derive(Debug, Clone)]
pub struct Cursor {
    text: Vec<char>,
    position: i64,
    segment_size: usize,
}

impl Cursor {
    /// Empty cursor in the "just loaded" state.
    pub fn new(segment_size: usize) -> Self {
        let segment_size = segment_size.max(1);
        Self {
            text: Vec::new(),
            position: -(segment_size as i64),
            segment_size,
        }
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    /// Current offset; may be `-segment_size` right after a load.
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Text length in characters.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The whole loaded text.
    pub fn full_text(&self) -> String {
        self.text.iter().collect()
    }

    /// Replace the text and show its first segment.
    pub fn jump_to(&mut self, body: &str) -> Segment {
        self.text = body.chars().collect();
        self.position = -self.step();
        self.advance(Direction::Forward, false)
    }

    /// Move one segment and render.
    ///
    /// With `is_resuming` the call only refreshes the display after an idle
    /// period: the position is lifted to at least 0 but does not move.
    pub fn advance(&mut self, direction: Direction, is_resuming: bool) -> Segment {
        let step = self.step();
        let len = self.len_i64();

        self.position = if is_resuming {
            self.position.max(0)
        } else {
            match direction {
                Direction::Forward => (self.position + step).min(len),
                Direction::Backward => (self.position - step).max(0),
            }
        };
        self.clamp_position();

        trace!(position = self.position, ?direction, is_resuming, "cursor moved");
        self.render()
    }

    /// Jump to an explicit offset (restore from state or a shelf entry).
    pub fn seek(&mut self, position: i64) -> Segment {
        self.position = position.clamp(0, self.len_i64());
        self.render()
    }

    /// Clear the text and return to the "just loaded" state.
    pub fn reset(&mut self) {
        self.text.clear();
        self.position = -self.step();
    }

    /// The visible window for the current position.
    ///
    /// The window ends at `position + segment_size` but never starts past
    /// `len - segment_size`.
    pub fn render(&self) -> Segment {
        let step = self.step();
        let len = self.len_i64();

        let start = self.position.min(len - step).max(0);
        let end = (self.position + step).clamp(start, len);
        let (start, end) = (start as usize, end as usize);

        Segment {
            text: self.text[start..end].iter().collect(),
            start,
            end,
            page: (self.position.max(0) / step) as usize,
            pages: self.len() / self.segment_size + 1,
        }
    }

    fn clamp_position(&mut self) {
        self.position = self.position.clamp(-self.step(), self.len_i64());
    }

    fn step(&self) -> i64 {
        self.segment_size as i64
    }

    fn len_i64(&self) -> i64 {
        self.text.len() as i64
    }
}
