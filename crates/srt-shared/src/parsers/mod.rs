//! Per-backend line parsers for sandbox denial events.
//!
//! # Backends
//!
//! - `darwin`: macOS unified log (`log show --style syslog`)
//! - `journal`: systemd journal (`journalctl -o short`)
//! - `dmesg`: kernel ring buffer (`dmesg -T`)
//!
//! Every parser is a pure function of one line and a [`ParseContext`].
//! Lines that don't match a backend's recognition pattern yield `None`;
//! that is never an error. Timestamps that can't be read fall back to the
//! context's collection time rather than dropping the line.

pub mod darwin;
pub mod dmesg;
pub mod journal;

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDateTime, TimeZone, TimeDelta};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

/// How far past "now" a year-less timestamp may land before it is treated
/// as belonging to the previous year
fn future_slack() -> TimeDelta {
    TimeDelta::days(1)
}

/// Context shared by every line of one collection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseContext {
    /// Collection time; substituted for unreadable timestamps
    pub now: DateTime<FixedOffset>,
    /// Requested lookback window, when known
    pub lookback: Option<Duration>,
}

impl ParseContext {
    /// Context for a collection happening right now, in local time.
    pub fn now() -> Self {
        Self::at(Local::now().fixed_offset())
    }

    pub fn at(now: DateTime<FixedOffset>) -> Self {
        Self { now, lookback: None }
    }

    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        self.lookback = Some(lookback);
        self
    }

    pub fn current_year(&self) -> i32 {
        self.now.year()
    }

    /// Earliest instant the lookback window covers, if a window is set
    pub fn window_start(&self) -> Option<DateTime<FixedOffset>> {
        let lookback = TimeDelta::from_std(self.lookback?).ok()?;
        self.now.checked_sub_signed(lookback)
    }

    /// Rebuild a year-less local timestamp such as `Nov 03 16:25:43`.
    ///
    /// `fmt` describes `stamp` without the year. The current year is used,
    /// except when that lands more than a day in the future and the previous
    /// year places the event inside the lookback window (a December event read
    /// in early January). Without a window the current year always wins.
    pub fn reconstruct_year(&self, stamp: &str, fmt: &str) -> Option<DateTime<FixedOffset>> {
        let normalized = stamp.split_whitespace().collect::<Vec<_>>().join(" ");
        let full_fmt = format!("%Y {}", fmt);
        let in_year = |year: i32| {
            NaiveDateTime::parse_from_str(&format!("{} {}", year, normalized), &full_fmt)
                .ok()
                .and_then(local_fixed)
        };

        let year = self.current_year();
        let current = in_year(year)?;

        if current > self.now + future_slack() {
            if let (Some(start), Some(previous)) = (self.window_start(), in_year(year - 1)) {
                if previous >= start - future_slack() {
                    return Some(previous);
                }
            }
        }

        Some(current)
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::now()
    }
}

/// Interpret a naive timestamp in the host's local zone.
///
/// Ambiguous times (DST fall-back) take the earlier instant; nonexistent
/// times (DST spring-forward gap) yield `None`.
pub fn local_fixed(naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

static BUBBLEWRAP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)bwrap|bubblewrap").unwrap());

/// Case-insensitive check that `haystack` names bubblewrap
pub(crate) fn mentions_bubblewrap(haystack: &str) -> bool {
    BUBBLEWRAP_PATTERN.is_match(haystack)
}
