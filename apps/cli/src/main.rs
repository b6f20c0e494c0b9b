//! glyphsync CLI: keep a local icon glyph registry in sync with a remote
//! design catalog.
//!
//! Assigns stable private-use code points and stages sanitized per-style SVG
//! artwork for font assembly.

mod commands;

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
