//! srtd - sandbox violation collector
//!
//! Harvests sandbox denials from the host's log backend and prints them as
//! `sandbox_violations` rows, once or on a polling cadence.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use srt_shared::window::parse_duration;
use srtd::collector::{select_collector, Backend};
use srtd::commands::{self, LogFormat, PollOptions};
use srtd::config::Config;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "srtd")]
#[command(about = "Sandbox violation collector", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: /etc/srt/config.toml, then /var/lib/srt/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect violations once and print them
    Collect {
        /// How far back to look, e.g. 1h, 30m, 1h30m
        #[arg(long)]
        since: Option<String>,

        #[arg(long, value_enum)]
        backend: Option<Backend>,

        /// Print table rows as JSON
        #[arg(long)]
        json: bool,

        /// Violations to show in human output
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Re-collect on an interval, one JSON line per poll
    Poll {
        #[arg(long)]
        since: Option<String>,

        #[arg(long, value_enum)]
        backend: Option<Backend>,

        /// Seconds between polls
        #[arg(long)]
        interval: Option<u64>,

        /// Per-poll timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Stop after this many polls
        #[arg(long)]
        count: Option<u64>,
    },

    /// Parse captured log text from a file ("-" for stdin)
    Parse {
        #[arg(long, value_enum)]
        format: LogFormat,

        input: PathBuf,

        #[arg(long)]
        json: bool,

        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Show the effective configuration
    Config,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path),
        None => Ok(Config::load()),
    }
}

fn resolve_since(flag: Option<&str>, config: &Config) -> Result<Duration> {
    let since = match flag {
        Some(raw) => parse_duration(raw).with_context(|| format!("invalid --since {:?}", raw))?,
        None => config.since()?,
    };
    if since.is_zero() {
        bail!("--since must be positive");
    }
    Ok(since)
}

fn positive_secs(flag: Option<u64>, fallback: u64, name: &str) -> Result<Duration> {
    let secs = flag.unwrap_or(fallback);
    if secs == 0 {
        bail!("--{} must be at least 1", name);
    }
    Ok(Duration::from_secs(secs))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!("srtd v{} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Collect {
            since,
            backend,
            json,
            limit,
        } => {
            let since = resolve_since(since.as_deref(), &config)?;
            let collector = select_collector(backend.unwrap_or(config.collector.backend));
            commands::collect(collector.as_ref(), since, json, limit)
        }
        Commands::Poll {
            since,
            backend,
            interval,
            timeout,
            count,
        } => {
            let opts = PollOptions {
                since: resolve_since(since.as_deref(), &config)?,
                interval: positive_secs(interval, config.poll.interval_secs, "interval")?,
                timeout: positive_secs(timeout, config.poll.timeout_secs, "timeout")?,
                count,
            };
            let collector = Arc::from(select_collector(backend.unwrap_or(config.collector.backend)));
            commands::poll(collector, opts).await
        }
        Commands::Parse {
            format,
            input,
            json,
            limit,
        } => commands::parse(format, &input, json, limit),
        Commands::Config => commands::show_config(&config),
    }
}
