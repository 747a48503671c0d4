//! Error types for NovelReader.
//!
//! Library crates use [`NovelReaderError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all NovelReader operations.
#[derive(Debug, thiserror::Error)]
pub enum NovelReaderError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP failure while fetching a chapter.
    #[error("fetch failed: {0}")]
    Transport(String),

    /// Malformed input that could not be interpreted (URLs, documents).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Reading-state serialization or write error.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A shelf entry addressed by name and URL does not exist.
    #[error("book not found on shelf: {name} ({url})")]
    BookNotFound { name: String, url: String },

    /// Data validation error (bad config value, unknown encoding label, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NovelReaderError>;

impl NovelReaderError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Shelf lookup miss for `name` at `url`.
    pub fn book_not_found(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::BookNotFound {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Whether this error is an informational "not on the shelf" result.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BookNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = NovelReaderError::config("segment_size must be positive");
        assert_eq!(err.to_string(), "config error: segment_size must be positive");

        let err = NovelReaderError::Transport("http://x/1.html: HTTP 503".into());
        assert!(err.to_string().starts_with("fetch failed:"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn not_found_is_informational() {
        let err = NovelReaderError::book_not_found("Foo", "http://x");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "book not found on shelf: Foo (http://x)");

        assert!(!NovelReaderError::validation("bad").is_not_found());
    }
}
