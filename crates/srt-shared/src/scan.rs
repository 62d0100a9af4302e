//! Line-by-line assembly of violations from captured log output.
//!
//! One pass, in source order, no look-ahead. The cheap `filter` runs before
//! the regex-based `parse`, so irrelevant lines never reach a pattern.

use crate::error::CollectError;
use crate::violation::Violation;
use std::io::BufRead;

/// Result of one collection: violations in source order plus an optional scan fault.
///
/// A fault stops the scan but keeps everything gathered before it.
#[derive(Debug, Default)]
pub struct Harvest {
    pub violations: Vec<Violation>,
    pub fault: Option<CollectError>,
}

impl Harvest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// All-or-nothing view: a scan fault becomes `Err`, dropping the partial results.
    pub fn into_result(self) -> Result<Vec<Violation>, CollectError> {
        match self.fault {
            Some(err) => Err(err),
            None => Ok(self.violations),
        }
    }

    /// Keep only violations matching `keep`, preserving order
    pub fn retain(&mut self, keep: impl FnMut(&Violation) -> bool) {
        self.violations.retain(keep);
    }
}

/// Scan `reader` line by line, keeping lines that pass `filter` and `parse`.
///
/// Bytes that aren't valid UTF-8 are replaced with U+FFFD and the line is
/// still considered. Only a read error from `reader` stops the scan.
pub fn scan_lines<R, F, P>(mut reader: R, source_name: &str, filter: F, mut parse: P) -> Harvest
where
    R: BufRead,
    F: Fn(&str) -> bool,
    P: FnMut(&str) -> Option<Violation>,
{
    let mut harvest = Harvest::new();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => line_no += 1,
            Err(e) => {
                harvest.fault = Some(CollectError::Scan {
                    source_name: source_name.to_string(),
                    line: line_no + 1,
                    source: e,
                });
                break;
            }
        }

        let line = String::from_utf8_lossy(strip_line_ending(&buf));

        if !filter(&line) {
            continue;
        }

        if let Some(violation) = parse(&line) {
            harvest.violations.push(violation);
        }
    }

    harvest
}

/// Drop a trailing `\n` or `\r\n`
fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
