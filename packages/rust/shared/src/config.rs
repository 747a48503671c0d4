//! Application configuration for NovelReader.
//!
//! User config lives at `~/.novelreader/novelreader.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NovelReaderError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "novelreader.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".novelreader";

/// Default reading-state file name inside the config directory.
const STATE_FILE_NAME: &str = "readingState.json";

/// Desktop browser UA; several novel hosts refuse obvious bot agents.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 Edg/138.0.0.0";

// ---------------------------------------------------------------------------
// Config structs (matching novelreader.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Paging and idle behaviour.
    #[serde(default)]
    pub reader: ReaderSection,

    /// HTTP and decoding settings.
    #[serde(default)]
    pub fetch: FetchSection,

    /// Anchor label sets used to find navigation links.
    #[serde(default)]
    pub labels: NavLabels,

    /// Reading-state location.
    #[serde(default)]
    pub storage: StorageSection,
}

/// `[reader]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderSection {
    /// Characters shown per segment.
    #[serde(default = "default_segment_size")]
    pub segment_size: usize,

    /// Inactivity after which the next action only refreshes the display.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for ReaderSection {
    fn default() -> Self {
        Self {
            segment_size: default_segment_size(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

fn default_segment_size() -> usize {
    30
}
fn default_idle_timeout_ms() -> u64 {
    5000
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    /// User-Agent header sent with every chapter request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// WHATWG encoding label used when charset detection is not confident.
    #[serde(default = "default_fallback_encoding")]
    pub fallback_encoding: String,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
            fallback_encoding: default_fallback_encoding(),
        }
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_redirects() -> usize {
    5
}
fn default_fallback_encoding() -> String {
    "gbk".into()
}

/// `[labels]` section: substrings matched against anchor text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLabels {
    /// Labels of the previous-chapter link.
    #[serde(default = "default_prev_labels")]
    pub prev: Vec<String>,

    /// Labels of the table-of-contents link.
    #[serde(default = "default_toc_labels")]
    pub toc: Vec<String>,

    /// Labels of the next-chapter link.
    #[serde(default = "default_next_labels")]
    pub next: Vec<String>,
}

impl Default for NavLabels {
    fn default() -> Self {
        Self {
            prev: default_prev_labels(),
            toc: default_toc_labels(),
            next: default_next_labels(),
        }
    }
}

impl NavLabels {
    /// Anchor text names the previous chapter.
    pub fn is_prev(&self, text: &str) -> bool {
        contains_any(text, &self.prev)
    }

    /// Anchor text names the table of contents.
    pub fn is_toc(&self, text: &str) -> bool {
        contains_any(text, &self.toc)
    }

    /// Anchor text names the next chapter.
    pub fn is_next(&self, text: &str) -> bool {
        contains_any(text, &self.next)
    }
}

fn contains_any(text: &str, labels: &[String]) -> bool {
    labels
        .iter()
        .any(|label| !label.is_empty() && text.contains(label.as_str()))
}

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}
fn default_prev_labels() -> Vec<String> {
    labels(&["上一章", "上一页"])
}
fn default_toc_labels() -> Vec<String> {
    labels(&["目录", "书籍", "章节", "列表"])
}
fn default_next_labels() -> Vec<String> {
    labels(&["下一章", "下一页"])
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSection {
    /// Reading-state JSON path; defaults to `~/.novelreader/readingState.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<String>,
}

impl AppConfig {
    /// Reject values the reader cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.reader.segment_size == 0 {
            return Err(NovelReaderError::validation(
                "reader.segment_size must be at least 1",
            ));
        }
        if self.fetch.fallback_encoding.trim().is_empty() {
            return Err(NovelReaderError::validation(
                "fetch.fallback_encoding must name an encoding",
            ));
        }
        Ok(())
    }

    /// Resolved reading-state path (configured value or the default location).
    pub fn state_file_path(&self) -> Result<PathBuf> {
        match &self.storage.state_file {
            Some(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
            _ => default_state_file(),
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime configs (derived from AppConfig)
// ---------------------------------------------------------------------------

/// Runtime cursor/session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Characters per displayed segment.
    pub segment_size: usize,
    /// Idle period after which the next action is a refresh only.
    pub idle_timeout: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ReaderConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            segment_size: config.reader.segment_size.max(1),
            idle_timeout: Duration::from_millis(config.reader.idle_timeout_ms),
        }
    }
}

/// Runtime fetch configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User-Agent header.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Redirect limit.
    pub max_redirects: usize,
    /// Fallback encoding label (resolved by the extractor).
    pub fallback_encoding: String,
    /// Navigation label sets.
    pub labels: NavLabels,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.fetch.user_agent.clone(),
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            max_redirects: config.fetch.max_redirects,
            fallback_encoding: config.fetch.fallback_encoding.clone(),
            labels: config.labels.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.novelreader/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NovelReaderError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.novelreader/novelreader.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Default reading-state path (`~/.novelreader/readingState.json`).
pub fn default_state_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(STATE_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NovelReaderError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        NovelReaderError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NovelReaderError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NovelReaderError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NovelReaderError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
