//! Binary crate for the `weatherdash` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - The interactive dashboard loop and its prompts
//! - Human-friendly output formatting

use anyhow::Result;
use clap::Parser;
use weatherdash_core::config::{LogFormat, LoggingConfig};

mod cli;
mod interactive;
mod prompt;
mod view;

/// Initializes tracing collection on stderr, keeping stdout for views.
fn setup_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::filter::Directive;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let fmt_layer = match config.format {
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;

    let filter_layer = config
        .filters
        .iter()
        .map(|d| d.parse::<Directive>())
        .try_fold(filter_layer, |layer, directive| {
            directive.map(|d| layer.add_directive(d))
        })?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = cli::Cli::parse();
    let config = cmd.config()?;
    setup_tracing(&config.logging)?;
    cmd.run(config).await
}
