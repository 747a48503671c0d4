//! HTTP chapter fetcher: one GET per chapter, raw bytes in, [`ChapterRecord`] out.

use encoding_rs::Encoding;
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use novelreader_shared::{ChapterRecord, FetchConfig, NavLabels, NovelReaderError, Result};

use crate::chapter::extract_chapter;
use crate::dom::ParsedPage;
use crate::encoding::{decode_with_fallback, encoding_for_label};

// ---------------------------------------------------------------------------
// ChapterFetcher
// ---------------------------------------------------------------------------

/// Fetches chapter pages and runs the extraction pipeline on them.
pub struct ChapterFetcher {
    client: Client,
    fallback: &'static Encoding,
    labels: NavLabels,
}

impl ChapterFetcher {
    /// Create a fetcher with the given configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let fallback = encoding_for_label(&config.fallback_encoding)?;

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                NovelReaderError::Transport(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            fallback,
            labels: config.labels.clone(),
        })
    }

    /// Fetch `url` and extract its chapter.
    ///
    /// Only transport failures are errors; a page the heuristics cannot read
    /// still yields a record with sentinel values.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_chapter(&self, url: &Url) -> Result<ChapterRecord> {
        let bytes = self.fetch_bytes(url).await?;
        let record = parse_chapter(&bytes, url, self.fallback, &self.labels);

        info!(
            title = %record.title,
            body_chars = record.body.chars().count(),
            "chapter fetched"
        );

        Ok(record)
    }

    /// GET `url` and return the undecoded body.
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        debug!(%url, "requesting chapter page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| NovelReaderError::Transport(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NovelReaderError::Transport(format!("{url}: HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| NovelReaderError::Transport(format!("{url}: body read failed: {e}")))?;

        debug!(status = status.as_u16(), bytes = body.len(), "chapter page received");
        Ok(body.to_vec())
    }
}

/// Decode, parse and extract in one synchronous step.
///
/// Kept separate from the async fetch so the non-`Send` parse tree never
/// lives across an await point.
pub fn parse_chapter(
    bytes: &[u8],
    url: &Url,
    fallback: &'static Encoding,
    labels: &NavLabels,
) -> ChapterRecord {
    let html = decode_with_fallback(bytes, fallback);
    let page = ParsedPage::parse(&html);
    extract_chapter(&page.root(), url, labels)
}
