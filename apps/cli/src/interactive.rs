//! Line-driven reading loop and the spinner shown while chapters load.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use novelreader_core::{FetchProgress, IdleTracker, ReadOutcome, Reader, View};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use url::Url;

const HELP: &str = "keys: Enter/n next · p previous · ] next chapter · [ previous chapter · \
                    o <url> open · q quit";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    NextSegment,
    PrevSegment,
    NextChapter,
    PrevChapter,
    Open(String),
    Help,
    Quit,
    Unknown(String),
}

impl Action {
    pub(crate) fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" | "n" | "j" => Self::NextSegment,
            "p" | "k" => Self::PrevSegment,
            "]" => Self::NextChapter,
            "[" => Self::PrevChapter,
            "?" | "h" | "help" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            _ => match line.strip_prefix("o ") {
                Some(url) if !url.trim().is_empty() => Self::Open(url.trim().to_string()),
                _ => Self::Unknown(line.to_string()),
            },
        }
    }

    /// Segment moves are the only actions an idle period turns into a refresh.
    fn is_paging(&self) -> bool {
        matches!(self, Self::NextSegment | Self::PrevSegment)
    }
}

/// Run the loop until `q` or end of input.
pub(crate) async fn run(reader: &mut Reader, first: Option<ReadOutcome>, idle_timeout: Duration) -> Result<()> {
    match first {
        Some(outcome) => show(&outcome),
        None => println!("No chapter open. Type `o <url>` to start reading."),
    }
    println!("{HELP}");

    let mut idle = IdleTracker::new(idle_timeout);
    idle.touch(Instant::now());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let action = Action::parse(&line);
        let is_resuming = idle.touch(Instant::now()) && action.is_paging();
        debug!(?action, is_resuming, "input");

        let outcome = match action {
            Action::Quit => break,
            Action::Help => {
                println!("{HELP}");
                continue;
            }
            Action::Unknown(input) => {
                println!("unknown command '{input}' ({HELP})");
                continue;
            }
            Action::NextSegment => Ok(reader.next_segment(is_resuming)),
            Action::PrevSegment => Ok(reader.prev_segment(is_resuming)),
            Action::NextChapter => reader.next_chapter().await,
            Action::PrevChapter => reader.prev_chapter().await,
            Action::Open(raw) => match Url::parse(&raw) {
                Ok(url) => reader.open(url).await,
                Err(e) => {
                    println!("invalid URL '{raw}': {e}");
                    continue;
                }
            },
        };

        match outcome {
            Ok(outcome) => show(&outcome),
            Err(e) => {
                warn!(error = %e, "chapter load failed");
                println!("load failed: {e}");
            }
        }
    }

    Ok(())
}

fn show(outcome: &ReadOutcome) {
    match outcome {
        ReadOutcome::Rendered(view) => {
            println!("{}", status_line(view));
            println!("{}", view.segment.text);
            if let Some(boundary) = view.boundary {
                println!("({})", boundary.message());
            }
        }
        ReadOutcome::Boundary(boundary) => println!("({})", boundary.message()),
        ReadOutcome::Discarded => debug!("superseded chapter load dropped"),
        ReadOutcome::Empty => println!("No chapter open. Type `o <url>` to start reading."),
    }
}

pub(crate) fn status_line(view: &View) -> String {
    format!(
        "[{}] {} (#{}) {}",
        view.book_name,
        view.chapter_title,
        view.chapter_number,
        view.segment.page_label()
    )
}

// ---------------------------------------------------------------------------
// Fetch spinner
// ---------------------------------------------------------------------------

/// indicatif spinner shown while a chapter is being fetched.
pub(crate) struct CliProgress {
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    pub(crate) fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }
}

impl FetchProgress for CliProgress {
    fn started(&self, url: &Url) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(Self::style());
        spinner.set_message(format!("Fetching {url}"));
        spinner.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(old) = slot.replace(spinner) {
                old.finish_and_clear();
            }
        }
    }

    fn finished(&self, _url: &Url, _ok: bool) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(spinner) = slot.take() {
                spinner.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use novelreader_core::{ChapterBoundary, Segment};

    #[test]
    fn parses_paging_keys() {
        assert_eq!(Action::parse(""), Action::NextSegment);
        assert_eq!(Action::parse(" n "), Action::NextSegment);
        assert_eq!(Action::parse("p"), Action::PrevSegment);
        assert_eq!(Action::parse("]"), Action::NextChapter);
        assert_eq!(Action::parse("["), Action::PrevChapter);
        assert_eq!(Action::parse("q"), Action::Quit);
    }

    #[test]
    fn parses_open_with_url() {
        assert_eq!(
            Action::parse("o https://example.com/1.html"),
            Action::Open("https://example.com/1.html".into())
        );
        assert_eq!(Action::parse("o "), Action::Unknown("o".into()));
        assert_eq!(Action::parse("zz"), Action::Unknown("zz".into()));
    }

    #[test]
    fn only_paging_is_idle_sensitive() {
        assert!(Action::NextSegment.is_paging());
        assert!(Action::PrevSegment.is_paging());
        assert!(!Action::NextChapter.is_paging());
        assert!(!Action::Quit.is_paging());
    }

    #[test]
    fn status_line_shows_book_chapter_and_page() {
        let view = View {
            segment: Segment {
                text: "正文".into(),
                start: 30,
                end: 60,
                page: 1,
                pages: 4,
            },
            chapter_number: "十二".into(),
            chapter_title: "第十二章 夜雨孤灯".into(),
            book_name: "青云志".into(),
            boundary: Some(ChapterBoundary::Last),
        };
        assert_eq!(status_line(&view), "[青云志] 第十二章 夜雨孤灯 (#十二) 1/4");
    }
}
