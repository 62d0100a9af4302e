//! Kernel ring buffer parser (`dmesg -T`).
//!
//! Lines carry a full human-readable timestamp, so no year reconstruction:
//! `[Mon Nov  3 16:25:43 2025] bwrap[4321]: Permission denied: /proc/sys/kernel`
//!
//! AppArmor audit records are also recognized; their `comm=`, `pid=`,
//! `operation=` and `name=` fields take precedence over free-text matching.

use super::journal::{extract_denial, is_candidate};
use super::{local_fixed, mentions_bubblewrap, ParseContext};
use crate::scan::{scan_lines, Harvest};
use crate::violation::Violation;
use crate::LINUX_DENY_CODE;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use regex::Regex;
use std::io::BufRead;
use std::sync::LazyLock;

static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\s*(\w{3}\s+\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}\s+\d{4})\]\s+(.+)$").unwrap()
});

/// `name[pid]: message` prefix of the body
static PROCESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w.-]+)\[(\d+)\]:\s+(.+)$").unwrap());

static AUDIT_COMM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bcomm="([^"]*)""#).unwrap());
static AUDIT_PID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bpid=(\d+)").unwrap());
static AUDIT_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bname="([^"]*)""#).unwrap());
static AUDIT_OPERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\boperation="([^"]*)""#).unwrap());

const HEADER_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Process attribution for kernel lines without one
const KERNEL_PROCESS: &str = "kernel";
const KERNEL_PID: &str = "0";

/// Parse one `dmesg -T` line.
pub fn parse_line(line: &str, ctx: &ParseContext) -> Option<Violation> {
    let caps = HEADER_PATTERN.captures(line)?;
    let body = &caps[2];

    let (process_name, process_id, message) = match PROCESS_PATTERN.captures(body) {
        Some(p) => (p[1].to_string(), p[2].to_string(), p.get(3).map_or("", |m| m.as_str())),
        None => {
            let comm = capture(&AUDIT_COMM, body);
            let pid = capture(&AUDIT_PID, body);
            (
                comm.unwrap_or(KERNEL_PROCESS).to_string(),
                pid.unwrap_or(KERNEL_PID).to_string(),
                body,
            )
        }
    };

    if !mentions_bubblewrap(&process_name) && !mentions_bubblewrap(message) {
        return None;
    }

    let timestamp = parse_timestamp(&caps[1]).unwrap_or(ctx.now);

    let (mut operation, mut target_path) = extract_denial(message);
    if let Some(op) = capture(&AUDIT_OPERATION, message) {
        operation = op.to_string();
    }
    if let Some(name) = capture(&AUDIT_NAME, message) {
        target_path = name.to_string();
    }

    Some(Violation {
        timestamp,
        process_name,
        process_id,
        operation,
        target_path,
        deny_code: LINUX_DENY_CODE.to_string(),
        raw_line: line.to_string(),
    })
}

fn capture<'a>(pattern: &Regex, haystack: &'a str) -> Option<&'a str> {
    pattern
        .captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn parse_timestamp(stamp: &str) -> Option<DateTime<FixedOffset>> {
    let normalized = stamp.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, HEADER_TIME_FORMAT)
        .ok()
        .and_then(local_fixed)
}

/// Scan captured `dmesg -T` output. Uses the journal keyword filter.
pub fn parse_output<R: BufRead>(reader: R, ctx: &ParseContext) -> Harvest {
    scan_lines(reader, "dmesg", is_candidate, |line| parse_line(line, ctx))
}
