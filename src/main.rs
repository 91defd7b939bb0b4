//! TeeVee - retro desktop companion services.
//!
//! This binary hosts the companion's data backends: audio file metadata
//! extraction for the media panel and slippy-map tile management for the
//! map panel, exposed through CLI commands.

pub mod cli;
pub mod config;
pub mod metadata;
#[cfg(test)]
pub mod test_utils;
pub mod tiles;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("teevee=info".parse().unwrap()))
        .init();

    cli::run_command(&args)
}
