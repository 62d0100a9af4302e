//! srtd subcommands.

use crate::collector::Collector;
use crate::config::Config;
use crate::table::{query_rows, to_row, Row, TABLE_NAME};
use anyhow::{Context, Result};
use chrono::Local;
use serde_json::json;
use srt_shared::parsers::{darwin, dmesg, journal};
use srt_shared::window::format_duration;
use srt_shared::{Harvest, ParseContext, Violation};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{info, warn};

/// Raw line prefix shown in human output
const RAW_PREVIEW_CHARS: usize = 100;

/// Text format accepted by `srtd parse`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// `log show --style syslog`
    Macos,
    /// `journalctl -o short`
    Journal,
    /// `dmesg -T`
    Dmesg,
}

/// Human listing: the first `limit` violations, then a remainder count
pub fn render_human(violations: &[Violation], limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Found {} violations:\n", violations.len());

    for (i, v) in violations.iter().enumerate() {
        if i >= limit {
            let _ = writeln!(out, "... and {} more", violations.len() - limit);
            break;
        }
        let _ = writeln!(out, "=== Violation #{} ===", i + 1);
        let _ = writeln!(out, "Timestamp:    {}", v.rfc3339_timestamp());
        let _ = writeln!(out, "Process:      {} (PID: {})", v.process_name, v.process_id);
        let _ = writeln!(out, "Operation:    {}", v.operation);
        let _ = writeln!(out, "Target Path:  {}", v.target_path);
        let _ = writeln!(out, "Deny Code:    {}", v.deny_code);
        let _ = writeln!(out, "Raw Line:     {}\n", v.short_raw_line(RAW_PREVIEW_CHARS));
    }

    out
}

pub fn rows_json(violations: &[Violation]) -> Result<String> {
    let rows: Vec<Row> = violations.iter().map(to_row).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// One line of `srtd poll` output
pub fn poll_record(poll: u64, rows: &[Row]) -> serde_json::Value {
    json!({
        "table": TABLE_NAME,
        "poll": poll,
        "polled_at": Local::now().to_rfc3339(),
        "rows": rows,
    })
}

/// One-shot collection. Retrieval errors fail the command; a scan fault
/// prints what was gathered and then fails.
pub fn collect(collector: &dyn Collector, since: Duration, json: bool, limit: usize) -> Result<()> {
    info!(
        "Collecting sandbox violations from the last {}",
        format_duration(since)
    );

    let harvest = collector
        .collect_violations(since)
        .map_err(|e| {
            let code = e.code();
            anyhow::Error::new(e).context(format!("collecting violations (code {})", code))
        })?;

    print_harvest(harvest, json, limit)
}

/// Parse previously captured log text without running any tool
pub fn parse(format: LogFormat, input: &Path, json: bool, limit: usize) -> Result<()> {
    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let harvest = parse_reader(format, reader, &ParseContext::now());
    print_harvest(harvest, json, limit)
}

pub fn parse_reader<R: BufRead>(format: LogFormat, reader: R, ctx: &ParseContext) -> Harvest {
    match format {
        LogFormat::Macos => darwin::parse_output(reader, ctx),
        LogFormat::Journal => journal::parse_output(reader, ctx),
        LogFormat::Dmesg => dmesg::parse_output(reader, ctx),
    }
}

fn print_harvest(harvest: Harvest, json: bool, limit: usize) -> Result<()> {
    if json {
        println!("{}", rows_json(&harvest.violations)?);
    } else {
        print!("{}", render_human(&harvest.violations, limit));
    }

    match harvest.fault {
        Some(fault) => Err(fault).context("log output was only partially read"),
        None => Ok(()),
    }
}

/// Print effective configuration
pub fn show_config(config: &Config) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Poll settings resolved from config and flags
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub since: Duration,
    pub interval: Duration,
    pub timeout: Duration,
    /// Stop after this many polls; run until Ctrl-C when `None`
    pub count: Option<u64>,
}

/// Re-run the table query on a fixed cadence, printing one JSON line per poll.
pub async fn poll(collector: Arc<dyn Collector>, opts: PollOptions) -> Result<()> {
    poll_with(collector, opts, |record| println!("{}", record)).await
}

/// Polling loop behind [`poll`], handing each record to `emit`.
///
/// Each poll runs on the blocking pool under `timeout`. A poll that times out
/// yields an empty row set; while it is still running no new poll starts, so
/// calls against the collector never overlap.
pub async fn poll_with<E>(collector: Arc<dyn Collector>, opts: PollOptions, mut emit: E) -> Result<()>
where
    E: FnMut(serde_json::Value),
{
    info!(
        "Polling {} every {}s (window {}, timeout {}s)",
        TABLE_NAME,
        opts.interval.as_secs(),
        format_duration(opts.since),
        opts.timeout.as_secs()
    );

    let mut ticker = interval(opts.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut in_flight: Option<JoinHandle<Vec<Row>>> = None;
    let mut polls: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                info!("Shutting down gracefully");
                break;
            }
        }

        if let Some(handle) = &in_flight {
            if !handle.is_finished() {
                warn!("Previous collection still running, skipping poll");
                continue;
            }
        }
        in_flight = None;

        let task_collector = Arc::clone(&collector);
        let since = opts.since;
        let mut handle =
            tokio::task::spawn_blocking(move || query_rows(task_collector.as_ref(), since));

        let outcome = timeout(opts.timeout, &mut handle).await;
        let rows = match outcome {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                warn!("Collection task error: {}", e);
                Vec::new()
            }
            Err(_) => {
                warn!("Collection timed out after {}s", opts.timeout.as_secs());
                in_flight = Some(handle);
                Vec::new()
            }
        };

        polls += 1;
        emit(poll_record(polls, &rows));

        if opts.count.is_some_and(|max| polls >= max) {
            break;
        }
    }

    Ok(())
}
