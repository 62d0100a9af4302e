//! Query-engine adapter for the `sandbox_violations` table.
//!
//! This is the only layer allowed to swallow collection errors: a failed
//! collection becomes an empty row set plus a warning, so a misconfigured
//! or permission-restricted log backend never fails the host query.

use crate::collector::Collector;
use srt_shared::Violation;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

pub const TABLE_NAME: &str = "sandbox_violations";

/// Text columns, in declaration order
pub const COLUMNS: [&str; 7] = [
    "timestamp",
    "process_name",
    "process_id",
    "operation",
    "target_path",
    "deny_code",
    "raw_line",
];

pub type Row = BTreeMap<&'static str, String>;

pub fn to_row(v: &Violation) -> Row {
    BTreeMap::from([
        ("timestamp", v.rfc3339_timestamp()),
        ("process_name", v.process_name.clone()),
        ("process_id", v.process_id.clone()),
        ("operation", v.operation.clone()),
        ("target_path", v.target_path.clone()),
        ("deny_code", v.deny_code.clone()),
        ("raw_line", v.raw_line.clone()),
    ])
}

/// Rows for one table query. Never fails.
pub fn query_rows(collector: &dyn Collector, since: Duration) -> Vec<Row> {
    debug!("Table query called for {}", TABLE_NAME);

    let harvest = match collector.collect_violations(since) {
        Ok(harvest) => harvest,
        Err(e) => {
            warn!("Error collecting violations (code {}): {}", e.code(), e);
            return Vec::new();
        }
    };

    if let Some(fault) = &harvest.fault {
        warn!(
            "Returning {} violations gathered before scan error: {}",
            harvest.len(),
            fault
        );
    }
    debug!("Found {} violations", harvest.len());

    harvest.violations.iter().map(to_row).collect()
}
