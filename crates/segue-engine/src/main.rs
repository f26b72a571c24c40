//! # Segue
//!
//! Command-line player for the Segue music engine.
//!
//! Plays an optional intro, then level music (explicit tracks, the
//! configured playlist, or a classic numbered song) on a fixed-rate tick
//! loop, and fades everything out on exit.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod timing;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::MusicConfig;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "segue")]
#[command(version)]
#[command(about = "Play level music with fades and playlists", long_about = None)]
pub struct Args {
    /// Config file (defaults to ./segue.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Intro track played before the level music
    #[arg(long)]
    pub intro: Option<PathBuf>,

    /// Shuffle the level tracks
    #[arg(long)]
    pub random: bool,

    /// Seconds of level music before fading out (0 = until interrupted)
    #[arg(short, long)]
    pub seconds: Option<u64>,

    /// Write the effective config to this path and exit
    #[arg(long, value_name = "PATH")]
    pub write_config: Option<PathBuf>,

    /// Level tracks, in play order
    pub tracks: Vec<PathBuf>,
}

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("segue=info".parse()?))
        .init();

    let args = Args::parse();

    info!("Segue starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = args.config.as_ref().map_or_else(MusicConfig::load, MusicConfig::load_from);
    config.validate();

    if let Some(path) = &args.write_config {
        config.save_to(path)?;
        return Ok(());
    }

    app::run(&args, &config)?;

    info!("Segue shutdown complete");
    Ok(())
}
