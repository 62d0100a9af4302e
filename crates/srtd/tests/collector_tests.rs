//! Collector orchestration tests using in-memory log sources.
//!
//! Covers fallback ordering, error propagation, partial results and the
//! table adapter's degrade-to-empty policy.

use srt_shared::CollectError;
use srtd::collector::{Collector, DarwinCollector, LinuxCollector, UnsupportedCollector};
use srtd::commands;
use srtd::sources::LogSource;
use srtd::table::{query_rows, COLUMNS};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

type CallLog = Arc<Mutex<Vec<String>>>;

/// Source that records each call and replays canned output or a failure
struct FakeSource {
    name: &'static str,
    output: Option<Vec<u8>>,
    /// Fail with a non-retrieval error instead of a spawn failure
    broken: bool,
    calls: CallLog,
}

impl FakeSource {
    fn ok(name: &'static str, output: impl Into<Vec<u8>>, calls: &CallLog) -> Box<Self> {
        Box::new(Self {
            name,
            output: Some(output.into()),
            broken: false,
            calls: Arc::clone(calls),
        })
    }

    fn failing(name: &'static str, calls: &CallLog) -> Box<Self> {
        Box::new(Self {
            name,
            output: None,
            broken: false,
            calls: Arc::clone(calls),
        })
    }

    fn broken(name: &'static str, calls: &CallLog) -> Box<Self> {
        Box::new(Self {
            name,
            output: None,
            broken: true,
            calls: Arc::clone(calls),
        })
    }
}

impl LogSource for FakeSource {
    fn name(&self) -> &str {
        self.name
    }

    fn read(&self, _since: Duration) -> Result<Vec<u8>, CollectError> {
        self.calls.lock().unwrap().push(self.name.to_string());
        match &self.output {
            Some(out) => Ok(out.clone()),
            None if self.broken => Err(CollectError::Scan {
                source_name: self.name.to_string(),
                line: 1,
                source: io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"),
            }),
            None => Err(CollectError::Spawn {
                command: self.name.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            }),
        }
    }
}

fn calls() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// `dmesg -T` line stamped a few seconds ago, so it sits inside any window
fn recent_dmesg_line(pid: u32, path: &str) -> String {
    let stamp = chrono::Local::now() - chrono::TimeDelta::seconds(5);
    format!(
        "[{}] bwrap[{}]: Permission denied: {}",
        stamp.format("%a %b %e %H:%M:%S %Y"),
        pid,
        path
    )
}

const MACOS_LINE: &str = "2025-11-03 16:25:43.448666+0900  localhost kernel[0]: (Sandbox) Sandbox: cat(13276) deny(1) file-read-data /Users/x/.ssh/config";
const JOURNAL_LINE: &str = "Nov 03 16:25:43 host bwrap[12345]: Permission denied: /path/to/file";

#[test]
fn test_linux_primary_success_skips_fallback() {
    let log = calls();
    let collector = LinuxCollector::with_sources(
        FakeSource::ok("journalctl", format!("{}\n", JOURNAL_LINE), &log),
        FakeSource::failing("dmesg", &log),
    );

    let harvest = collector.collect_violations(HOUR).unwrap();
    assert_eq!(harvest.len(), 1);
    assert_eq!(harvest.violations[0].process_id, "12345");
    assert_eq!(*log.lock().unwrap(), vec!["journalctl"]);
}

#[test]
fn test_linux_falls_back_before_failing() {
    let log = calls();
    let output = format!(
        "{}\n[Mon Jan  1 00:00:00 2001] bwrap[1]: Permission denied: /ancient\n{}\n",
        recent_dmesg_line(77, "/etc/shadow"),
        recent_dmesg_line(78, "/root")
    );
    let collector = LinuxCollector::with_sources(
        FakeSource::failing("journalctl", &log),
        FakeSource::ok("dmesg", output, &log),
    );

    let harvest = collector.collect_violations(HOUR).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["journalctl", "dmesg"]);

    // The 2001 entry predates the window and is dropped; order is kept
    let pids: Vec<_> = harvest.violations.iter().map(|v| v.process_id.as_str()).collect();
    assert_eq!(pids, vec!["77", "78"]);
    assert!(harvest.violations.iter().all(|v| v.deny_code == "EPERM"));
}

#[test]
fn test_linux_both_failing_reports_fallback_failure() {
    let log = calls();
    let collector = LinuxCollector::with_sources(
        FakeSource::failing("journalctl", &log),
        FakeSource::failing("dmesg", &log),
    );

    let err = collector.collect_violations(HOUR).unwrap_err();
    assert_eq!(*log.lock().unwrap(), vec!["journalctl", "dmesg"]);
    assert!(err.is_source_unavailable());
    assert!(matches!(
        err.final_failure(),
        CollectError::Spawn { command, .. } if command == "dmesg"
    ));
    assert!(err.to_string().starts_with("failed to execute dmesg"));
}

#[test]
fn test_linux_only_retrieval_failures_fall_back() {
    let log = calls();
    let collector = LinuxCollector::with_sources(
        FakeSource::broken("journalctl", &log),
        FakeSource::ok("dmesg", recent_dmesg_line(1, "/x"), &log),
    );

    let err = collector.collect_violations(HOUR).unwrap_err();
    assert!(err.is_scan_fault());
    assert_eq!(*log.lock().unwrap(), vec!["journalctl"]);
}

#[test]
fn test_collect_command_reports_error_code() {
    let err = commands::collect(&UnsupportedCollector::new("plan9"), HOUR, true, 5).unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("code -33005"), "{msg}");
    assert!(msg.contains("platform plan9"), "{msg}");
}

#[test]
fn test_darwin_failure_is_hard_error() {
    let log = calls();
    let collector = DarwinCollector::with_source(FakeSource::failing("log show", &log));
    let err = collector.collect_violations(HOUR).unwrap_err();
    assert!(matches!(err, CollectError::Spawn { .. }));
    assert_eq!(*log.lock().unwrap(), vec!["log show"]);
}

#[test]
fn test_darwin_parses_source_output() {
    let log = calls();
    let output = format!(
        "Filtering the log data using \"eventMessage CONTAINS ...\"\n{}\nnot a sandbox line\n",
        MACOS_LINE
    );
    let collector = DarwinCollector::with_source(FakeSource::ok("log show", output, &log));
    let harvest = collector.collect_violations(HOUR).unwrap();
    assert_eq!(harvest.len(), 1);
    let v = &harvest.violations[0];
    assert_eq!(v.operation, "file-read-data");
    assert_eq!(v.raw_line, MACOS_LINE);
}

#[test]
fn test_empty_output_is_empty_success() {
    let log = calls();
    let collector = DarwinCollector::with_source(FakeSource::ok("log show", "", &log));
    let harvest = collector.collect_violations(HOUR).unwrap();
    assert!(harvest.is_empty());
    assert!(harvest.fault.is_none());
}

#[test]
fn test_undecodable_line_keeps_later_violations() {
    let log = calls();
    let mut output = b"Nov 03 16:25:43 host bwrap[1]: Permission denied: /a\n".to_vec();
    output.extend_from_slice(b"Nov 03 16:25:44 host legacyd[5]: caf\xe9 started\n");
    output.extend_from_slice(b"Nov 03 16:25:45 host bwrap[2]: Permission denied: /b\n");
    output.extend_from_slice(b"Nov 03 16:25:46 host bwrap[3]: Permission denied: /c\n");

    let collector = LinuxCollector::with_sources(
        FakeSource::ok("journalctl", output, &log),
        FakeSource::failing("dmesg", &log),
    );
    let harvest = collector.collect_violations(HOUR).unwrap();
    assert!(harvest.fault.is_none());
    let paths: Vec<_> = harvest.violations.iter().map(|v| v.target_path.as_str()).collect();
    assert_eq!(paths, vec!["/a", "/b", "/c"]);
    assert_eq!(*log.lock().unwrap(), vec!["journalctl"]);
}

#[test]
fn test_table_adapter_degrades_errors_to_empty() {
    let collector = UnsupportedCollector::new("plan9");
    assert!(query_rows(&collector, HOUR).is_empty());

    let log = calls();
    let failing = LinuxCollector::with_sources(
        FakeSource::failing("journalctl", &log),
        FakeSource::failing("dmesg", &log),
    );
    assert!(query_rows(&failing, HOUR).is_empty());
}

#[test]
fn test_table_adapter_rows() {
    let log = calls();
    let collector =
        DarwinCollector::with_source(FakeSource::ok("log show", format!("{}\n", MACOS_LINE), &log));
    let rows = query_rows(&collector, HOUR);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), COLUMNS.len());
    assert_eq!(rows[0]["timestamp"], "2025-11-03T16:25:43+09:00");
    assert_eq!(rows[0]["target_path"], "/Users/x/.ssh/config");
    assert_eq!(rows[0]["raw_line"], MACOS_LINE);
}
