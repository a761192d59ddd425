//! duoqr - screen-to-camera transfer over animated QR code pairs
//!
//! A CLI for streaming a payload as rotating pairs of QR codes and
//! reassembling it from captured frames.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use duoqr::config::Config;
use duoqr::logging::{init_logging, Verbosity};

use commands::{CommandExecutor, EncodeCommand, InfoCommand, PlayCommand, ScanCommand};

/// duoqr - send text from a screen to a camera with animated QR code pairs
///
/// The payload is chunked, two chunks go into each QR code, and two codes
/// are shown per frame. Any camera that sees every chunk once, in any
/// order, can rebuild the payload.
#[derive(Parser)]
#[command(name = "duoqr")]
#[command(version)]
#[command(about = "Screen-to-camera transfer over animated QR code pairs")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file (default: ./duoqr.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every frame of a stream to image files
    Encode(EncodeCommand),

    /// Animate a stream in the terminal
    Play(PlayCommand),

    /// Rebuild a payload from captured frame images
    Scan(ScanCommand),

    /// Show the chunk plan for a payload at every tier
    Info(InfoCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(Verbosity::from_flags(cli.quiet, cli.verbose));

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let command: &dyn CommandExecutor = match &cli.command {
        Commands::Encode(cmd) => cmd,
        Commands::Play(cmd) => cmd,
        Commands::Scan(cmd) => cmd,
        Commands::Info(cmd) => cmd,
    };
    command.execute(&config)
}
