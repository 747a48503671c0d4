//! novelreader: read web-novel chapters a few lines at a time in the terminal.
//!
//! Fetches a chapter page, extracts its text and navigation links, and pages
//! through it while remembering the position and a bookshelf of recent books.

mod commands;
mod interactive;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
