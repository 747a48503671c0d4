//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use novelreader_core::Reader;
use novelreader_extractor::ChapterFetcher;
use novelreader_shared::{AppConfig, FetchConfig, ReaderConfig, init_config, load_config};
use novelreader_storage::StateStore;
use tracing::{info, warn};
use url::Url;

use crate::interactive::{self, CliProgress};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// novelreader: page through web-novel chapters from the terminal.
#[derive(Parser)]
#[command(
    name = "novelreader",
    version,
    about = "Read web-novel chapters a segment at a time, with a remembered bookshelf.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reading-state file (overrides `[storage].state_file`).
    #[arg(long, env = "NOVELREADER_STATE_FILE", global = true)]
    pub state_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start reading. Without a URL, picks up where the last session ended.
    Read {
        /// Chapter page URL.
        url: Option<String>,
    },

    /// Resume the last session.
    Resume,

    /// Fetch one chapter and print what was extracted.
    Fetch {
        /// Chapter page URL.
        url: String,

        /// Print the full record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Bookshelf management.
    Shelf {
        #[command(subcommand)]
        action: ShelfAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Bookshelf subcommands.
#[derive(Subcommand)]
pub(crate) enum ShelfAction {
    /// List remembered books, most recent first.
    List,
    /// Continue reading a book from the shelf.
    Open {
        /// Book name as shown by `shelf list`.
        name: String,
    },
    /// Forget a book.
    Remove {
        /// Book name as shown by `shelf list`.
        name: String,

        /// Chapter URL of the entry (defaults to the one stored for `name`).
        #[arg(long)]
        url: Option<String>,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr, text to stdout.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "novelreader=info",
        1 => "novelreader=debug",
        _ => "novelreader=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    // Must work even when the existing file no longer parses.
    if let Command::Config {
        action: ConfigAction::Init,
    } = cli.command
    {
        return cmd_config_init();
    }

    let config = load_config()?;
    let state_file = match cli.state_file {
        Some(path) => path,
        None => config.state_file_path()?,
    };

    match cli.command {
        Command::Read { url } => cmd_read(&config, state_file, url.as_deref()).await,
        Command::Resume => cmd_resume(&config, state_file).await,
        Command::Fetch { url, json } => cmd_fetch(&config, &url, json).await,
        Command::Shelf { action } => match action {
            ShelfAction::List => cmd_shelf_list(state_file),
            ShelfAction::Open { name } => cmd_shelf_open(&config, state_file, &name).await,
            ShelfAction::Remove { name, url } => cmd_shelf_remove(state_file, &name, url.as_deref()),
        },
        Command::Config { action } => match action {
            ConfigAction::Show => cmd_config_show(&config),
            ConfigAction::Init => cmd_config_init(),
        },
    }
}

fn build_reader(config: &AppConfig, state_file: PathBuf) -> Result<Reader> {
    let fetcher = ChapterFetcher::new(&FetchConfig::from(config))?;
    let store = StateStore::new(state_file);
    Ok(Reader::new(fetcher, store, &ReaderConfig::from(config)).with_progress(CliProgress::new()))
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|e| eyre!("invalid URL '{raw}': {e}"))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_read(config: &AppConfig, state_file: PathBuf, url: Option<&str>) -> Result<()> {
    let mut reader = build_reader(config, state_file)?;

    let first = match url {
        Some(raw) => Some(reader.open(parse_url(raw)?).await?),
        None => match reader.resume().await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "could not resume last session");
                None
            }
        },
    };

    interactive::run(&mut reader, first, ReaderConfig::from(config).idle_timeout).await
}

async fn cmd_resume(config: &AppConfig, state_file: PathBuf) -> Result<()> {
    let mut reader = build_reader(config, state_file)?;
    match reader.resume().await? {
        Some(outcome) => {
            interactive::run(&mut reader, Some(outcome), ReaderConfig::from(config).idle_timeout).await
        }
        None => {
            println!("Nothing to resume. Start with: novelreader read <URL>");
            Ok(())
        }
    }
}

async fn cmd_fetch(config: &AppConfig, url: &str, json: bool) -> Result<()> {
    let url = parse_url(url)?;
    let fetcher = ChapterFetcher::new(&FetchConfig::from(config))?;

    let progress = CliProgress::new();
    let record = {
        use novelreader_core::FetchProgress;
        progress.started(&url);
        let fetched = fetcher.fetch_chapter(&url).await;
        progress.finished(&url, fetched.is_ok());
        fetched?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    let show = |link: &Option<Url>| link.as_ref().map_or("-".to_string(), Url::to_string);
    println!();
    println!("  Title:   {}", record.title);
    println!("  Number:  {}", record.chapter_number);
    println!("  Book:    {}", record.book_title.as_deref().unwrap_or("-"));
    println!("  Length:  {} chars", record.body.chars().count());
    println!("  Prev:    {}", show(&record.prev_url));
    println!("  TOC:     {}", show(&record.toc_url));
    println!("  Next:    {}", show(&record.next_url));
    println!();

    Ok(())
}

fn cmd_shelf_list(state_file: PathBuf) -> Result<()> {
    let shelf = StateStore::new(state_file).bookshelf();
    if shelf.is_empty() {
        println!("The bookshelf is empty.");
        return Ok(());
    }

    for (i, book) in shelf.iter().enumerate() {
        println!("{:>3}. {}  @{}  {}", i + 1, book.bookname, book.position, book.chapterurl);
    }
    Ok(())
}

async fn cmd_shelf_open(config: &AppConfig, state_file: PathBuf, name: &str) -> Result<()> {
    let mut reader = build_reader(config, state_file)?;
    let entry = reader
        .bookshelf()
        .into_iter()
        .find(|b| b.bookname == name)
        .ok_or_else(|| eyre!("no book named '{name}' on the shelf"))?;

    info!(bookname = %entry.bookname, url = %entry.chapterurl, "opening shelf entry");
    let first = reader.open_book(&entry).await?;
    interactive::run(&mut reader, Some(first), ReaderConfig::from(config).idle_timeout).await
}

fn cmd_shelf_remove(state_file: PathBuf, name: &str, url: Option<&str>) -> Result<()> {
    let store = StateStore::new(state_file);

    let url = match url {
        Some(url) => url.to_string(),
        None => match store.bookshelf().into_iter().find(|b| b.bookname == name) {
            Some(entry) => entry.chapterurl,
            None => {
                println!("No book named '{name}' on the shelf.");
                return Ok(());
            }
        },
    };

    match store.remove_book(name, &url) {
        Ok(removed) => {
            println!("Removed '{}' from the shelf.", removed.bookname);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            println!("{e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
