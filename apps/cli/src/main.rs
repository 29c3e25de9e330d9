//! ContextPacker CLI — crawl a website into a folder of Markdown files.
//!
//! The folder is meant to be concatenated into a single LLM context.

mod commands;
mod progress;

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
