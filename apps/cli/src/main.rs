//! docbind CLI: generate typed bindings from an HTML API reference page.
//!
//! Scrapes the reference, infers its type model, and writes a JSON snapshot plus
//! generated model and binding sources.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
