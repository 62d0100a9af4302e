//! macOS unified log parser (`log show --style syslog`).
//!
//! Example line:
//! `2025-11-03 16:25:43.448666+0900  localhost kernel[0]: (Sandbox) Sandbox: cat(13276) deny(1) file-read-data /Users/x/.ssh/config`

use super::ParseContext;
use crate::scan::{scan_lines, Harvest};
use crate::violation::Violation;
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::io::BufRead;
use std::sync::LazyLock;

/// Substring every candidate line must contain
pub const SANDBOX_MARKER: &str = "Sandbox:";

/// `actor(pid) deny(code) operation [target]`; actor may contain spaces and dots
static SANDBOX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Sandbox:\s+(.+?)\((\d+)\)\s+deny\((\d+)\)\s+([\w-]+)(?:\s+(.+))?$").unwrap()
});

/// Leading `YYYY-MM-DD HH:MM:SS.ffffff+ZZZZ`
static TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})\s+(\d{2}:\d{2}:\d{2}\.\d+[+-]\d{4})").unwrap()
});

/// Cheap pre-filter applied before any pattern
pub fn is_candidate(line: &str) -> bool {
    line.contains(SANDBOX_MARKER)
}

/// Parse one `log show` line. `None` unless the sandbox body matches.
pub fn parse_line(line: &str, ctx: &ParseContext) -> Option<Violation> {
    let caps = SANDBOX_PATTERN.captures(line)?;

    let timestamp = parse_timestamp(line).unwrap_or(ctx.now);

    Some(Violation {
        timestamp,
        process_name: caps[1].to_string(),
        process_id: caps[2].to_string(),
        deny_code: caps[3].to_string(),
        operation: caps[4].to_string(),
        target_path: caps
            .get(5)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        raw_line: line.to_string(),
    })
}

fn parse_timestamp(line: &str) -> Option<DateTime<FixedOffset>> {
    let caps = TIMESTAMP_PATTERN.captures(line)?;
    let stamp = format!("{} {}", &caps[1], &caps[2]);
    DateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S%.f%z").ok()
}

/// Scan captured `log show` output.
pub fn parse_output<R: BufRead>(reader: R, ctx: &ParseContext) -> Harvest {
    scan_lines(reader, "log show", is_candidate, |line| parse_line(line, ctx))
}
