//! Log sources - external tools queried for a lookback window.
//!
//! A source returns the tool's captured stdout, untouched. Exit status and
//! stdout are the only channel; stderr only ends up in the error message.

use srt_shared::window::{journal_since, log_show_last};
use srt_shared::CollectError;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, warn};

/// Predicate handed to `log show`; both markers must appear in the message
pub const LOG_SHOW_PREDICATE: &str = r#"eventMessage CONTAINS "Sandbox:" AND eventMessage CONTAINS "deny""#;

/// Raw text provider for one logging backend
pub trait LogSource: Send + Sync {
    /// Short name used in logs and errors, e.g. `journalctl`
    fn name(&self) -> &str;

    /// Retrieve raw output covering the last `since`
    fn read(&self, since: Duration) -> Result<Vec<u8>, CollectError>;
}

type ArgsFn = Box<dyn Fn(Duration) -> Vec<String> + Send + Sync>;

/// Source backed by an external command with a fixed argument template
pub struct CommandSource {
    name: String,
    program: String,
    args: ArgsFn,
}

impl CommandSource {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: impl Fn(Duration) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Box::new(args),
        }
    }

    /// macOS unified log: `log show --predicate … --style syslog --last Nm`
    pub fn log_show() -> Self {
        Self::new("log show", "log", |since| {
            vec![
                "show".to_string(),
                "--predicate".to_string(),
                LOG_SHOW_PREDICATE.to_string(),
                "--style".to_string(),
                "syslog".to_string(),
                "--last".to_string(),
                log_show_last(since),
            ]
        })
    }

    /// systemd journal: `journalctl --since "N minutes ago" --no-pager -o short`
    pub fn journalctl() -> Self {
        Self::new("journalctl", "journalctl", |since| {
            vec![
                "--since".to_string(),
                journal_since(since),
                "--no-pager".to_string(),
                "-o".to_string(),
                "short".to_string(),
            ]
        })
    }

    /// Kernel ring buffer with human-readable timestamps. Has no window
    /// argument; the collector bounds the result instead.
    pub fn dmesg() -> Self {
        Self::new("dmesg", "dmesg", |_| vec!["-T".to_string()])
    }

    /// Replace the executable, keeping the argument template
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn args_for(&self, since: Duration) -> Vec<String> {
        (self.args)(since)
    }

    pub fn command_line(&self, since: Duration) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args_for(since));
        parts.join(" ")
    }
}

impl LogSource for CommandSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, since: Duration) -> Result<Vec<u8>, CollectError> {
        debug!("Running {}", self.command_line(since));

        let output = Command::new(&self.program)
            .args(self.args_for(since))
            .output()
            .map_err(|e| CollectError::Spawn {
                command: self.name.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("{} failed: {}", self.name, stderr);
            return Err(CollectError::ExitStatus {
                command: self.name.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        debug!("{} returned {} bytes", self.name, output.stdout.len());
        Ok(output.stdout)
    }
}
