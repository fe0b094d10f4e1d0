//! docmirror CLI - Command-line interface for docmirror
//!
//! Provides commands for:
//! - Mirroring an account's repositories and documents into the local cache
//! - Inspecting and validating the configuration

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use docmirror_core::config::Config;

mod commands;
mod output;

use commands::{config::ConfigCommand, sync::SyncCommand};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "docmirror",
    version,
    about = "Incremental local mirror of a Yuque account"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Mirror the account into the local cache
    Sync(SyncCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = load_config(&config_path, cli.config.is_some())?;

    // Only a sync run writes the log file; inspecting the config must not
    // touch the cache directory.
    let log_file = match cli.command {
        Commands::Sync(_) => config.log_file(),
        Commands::Config(_) => None,
    };
    init_tracing(cli.verbose, &config.logging.level, log_file.as_deref())?;

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(config, format).await,
        Commands::Config(cmd) => cmd.execute(config, &config_path, format).await,
    }
}

/// An explicitly requested file must load; the default location may be
/// absent.
fn load_config(path: &Path, explicit: bool) -> Result<Config> {
    let loaded = if explicit {
        Config::load(path)
    } else {
        Config::load_or_default(path)
    };
    loaded.with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Console layer on stderr filtered by `RUST_LOG`, `-v` or `logging.level`,
/// plus a debug-level file layer truncated per run
fn init_tracing(verbose: u8, level: &str, log_file: Option<&Path>) -> Result<()> {
    let level = match verbose {
        0 => level,
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter);

    let file = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory {}", parent.display())
                })?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .init();

    Ok(())
}
