//! Lookback window parsing and per-tool formatting.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("missing unit after {0} in {1:?} (use s, m, h or d)")]
    MissingUnit(u64, String),

    #[error("unknown unit {0:?} in {1:?} (use s, m, h or d)")]
    UnknownUnit(String, String),

    #[error("expected a number in {0:?}")]
    ExpectedNumber(String),

    #[error("duration {0:?} is too large")]
    Overflow(String),
}

/// Parse a compound duration like `1h`, `90m`, `1h30m`, `45s` or `2d`.
///
/// A bare `0` is accepted; any other number needs a unit.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total: u64 = 0;
    let mut rest = s;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(DurationError::ExpectedNumber(s.to_string()));
        }
        let value: u64 = rest[..digits_end]
            .parse()
            .map_err(|_| DurationError::Overflow(s.to_string()))?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let scale = match unit {
            "" => return Err(DurationError::MissingUnit(value, s.to_string())),
            "s" => 1,
            "m" => 60,
            "h" => 3600,
            "d" => 86_400,
            other => return Err(DurationError::UnknownUnit(other.to_string(), s.to_string())),
        };

        total = value
            .checked_mul(scale)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| DurationError::Overflow(s.to_string()))?;
    }

    Ok(Duration::from_secs(total))
}

/// Whole minutes covering `since`, rounded up so short windows aren't empty
fn ceil_minutes(since: Duration) -> u64 {
    let secs = since.as_secs() + u64::from(since.subsec_nanos() > 0);
    secs.div_ceil(60)
}

/// `log show --last` argument, e.g. `60m`
pub fn log_show_last(since: Duration) -> String {
    format!("{}m", ceil_minutes(since))
}

/// `journalctl --since` argument: `N hours ago` for whole hours, else `N minutes ago`
pub fn journal_since(since: Duration) -> String {
    let secs = since.as_secs();
    if secs >= 3600 && secs % 3600 == 0 && since.subsec_nanos() == 0 {
        format!("{} hours ago", secs / 3600)
    } else {
        format!("{} minutes ago", ceil_minutes(since))
    }
}

/// Human form of a window for log messages, e.g. `1h30m`
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs == 0 {
        return "0s".to_string();
    }
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{}h", h));
    }
    if m > 0 {
        out.push_str(&format!("{}m", m));
    }
    if s > 0 {
        out.push_str(&format!("{}s", s));
    }
    out
}
