//! systemd journal parser (`journalctl -o short`) for bubblewrap denials.
//!
//! Format: "Nov 03 16:25:43 hostname bwrap[12345]: Permission denied: /path/to/file"
//! The header carries no year; see [`ParseContext::reconstruct_year`].

use super::{mentions_bubblewrap, ParseContext};
use crate::scan::{scan_lines, Harvest};
use crate::violation::Violation;
use crate::{LINUX_DENY_CODE, UNKNOWN_OPERATION};
use regex::{Regex, RegexBuilder};
use std::io::BufRead;
use std::sync::LazyLock;

/// Keywords (matched case-insensitively); a line must contain one to reach the parser
pub const CANDIDATE_KEYWORDS: [&str; 3] = ["bwrap", "bubblewrap", "permission denied"];

static CANDIDATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(&CANDIDATE_KEYWORDS.map(regex::escape).join("|"))
        .case_insensitive(true)
        .build()
        .unwrap()
});

/// `Mon DD HH:MM:SS host name[pid]: message`
static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+\s+\d+\s+\d{2}:\d{2}:\d{2})\s+\S+\s+([\w.-]+)\[(\d+)\]:\s+(.+)$").unwrap()
});

/// Denial phrase followed by the first path-like token
pub(crate) static DENIAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(permission denied|eperm|access denied|denied).*?([/\w\-.]+)").unwrap()
});

const HEADER_TIME_FORMAT: &str = "%b %d %H:%M:%S";

/// Recall-oriented keyword filter (over-inclusive; the parser decides)
pub fn is_candidate(line: &str) -> bool {
    CANDIDATE_PATTERN.is_match(line)
}

/// Parse one journal line. `None` unless the header matches and the line
/// is attributable to bubblewrap.
pub fn parse_line(line: &str, ctx: &ParseContext) -> Option<Violation> {
    let caps = HEADER_PATTERN.captures(line)?;
    let process_name = &caps[2];
    let message = &caps[4];

    if !mentions_bubblewrap(process_name) && !mentions_bubblewrap(message) {
        return None;
    }

    let timestamp = ctx
        .reconstruct_year(&caps[1], HEADER_TIME_FORMAT)
        .unwrap_or(ctx.now);
    let (operation, target_path) = extract_denial(message);

    Some(Violation {
        timestamp,
        process_name: process_name.to_string(),
        process_id: caps[3].to_string(),
        operation,
        target_path,
        deny_code: LINUX_DENY_CODE.to_string(),
        raw_line: line.to_string(),
    })
}

/// Operation phrase and path from a message, or ("unknown", "") on a miss
pub(crate) fn extract_denial(message: &str) -> (String, String) {
    match DENIAL_PATTERN.captures(message) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => (UNKNOWN_OPERATION.to_string(), String::new()),
    }
}

/// Scan captured journalctl output.
pub fn parse_output<R: BufRead>(reader: R, ctx: &ParseContext) -> Harvest {
    scan_lines(reader, "journalctl", is_candidate, |line| parse_line(line, ctx))
}
