//! Shared types, error model, and configuration for NovelReader.
//!
//! This crate is the foundation depended on by all other NovelReader crates.
//! It provides:
//! - [`NovelReaderError`]: the unified error type
//! - Domain types ([`ChapterRecord`], [`BookshelfEntry`], [`ReadingState`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], [`ReaderConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, FetchSection, NavLabels, ReaderConfig, ReaderSection,
    StorageSection, config_dir, config_file_path, default_state_file, init_config, load_config,
    load_config_from,
};
pub use error::{NovelReaderError, Result};
pub use types::{
    BookshelfEntry, ChapterRecord, ReadingState, UNKNOWN_BOOK, UNKNOWN_CHAPTER,
    UNKNOWN_CHAPTER_NUMBER,
};
