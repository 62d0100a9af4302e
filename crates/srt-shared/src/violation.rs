//! The normalized sandbox violation record.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};

/// One parsed denial event.
///
/// Built only from a line that matched its backend's recognition pattern.
/// `raw_line` is always the exact source line, untrimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// When the event occurred (collection time if the log text had no usable timestamp)
    pub timestamp: DateTime<FixedOffset>,
    pub process_name: String,
    /// Kept as text; backends format PIDs inconsistently
    pub process_id: String,
    /// Denied action, e.g. `file-read-data` on macOS or `Permission denied` on Linux
    pub operation: String,
    /// May be empty when the backend does not surface a target
    pub target_path: String,
    pub deny_code: String,
    pub raw_line: String,
}

impl Violation {
    /// Timestamp in RFC3339 with whole seconds, `Z` for UTC.
    pub fn rfc3339_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Raw line cut to at most `max_chars` characters, for human display
    pub fn short_raw_line(&self, max_chars: usize) -> &str {
        match self.raw_line.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.raw_line[..idx],
            None => &self.raw_line,
        }
    }
}
