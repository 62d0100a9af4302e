//! Error types for violation collection.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectError {
    /// The log tool could not be started at all (missing binary, EACCES)
    #[error("failed to execute {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The log tool ran but exited non-zero
    #[error("{command} exited with {status}: {stderr}")]
    ExitStatus {
        command: String,
        status: String,
        stderr: String,
    },

    /// Primary and fallback sources both failed. Displays the fallback failure first.
    #[error("{fallback} (primary source failed first: {primary})")]
    Fallback {
        primary: Box<CollectError>,
        #[source]
        fallback: Box<CollectError>,
    },

    /// Reading the captured output failed mid-stream
    #[error("error scanning {source_name} output at line {line}: {source}")]
    Scan {
        source_name: String,
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("no sandbox violation collector for platform {platform}")]
    Unsupported { platform: String },
}

impl CollectError {
    pub fn code(&self) -> i32 {
        match self {
            CollectError::Spawn { .. } => -33001,
            CollectError::ExitStatus { .. } => -33002,
            CollectError::Fallback { .. } => -33003,
            CollectError::Scan { .. } => -33004,
            CollectError::Unsupported { .. } => -33005,
        }
    }

    /// True for retrieval failures (tool missing, non-zero exit), which trigger fallback
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            CollectError::Spawn { .. } | CollectError::ExitStatus { .. } | CollectError::Fallback { .. }
        )
    }

    pub fn is_scan_fault(&self) -> bool {
        matches!(self, CollectError::Scan { .. })
    }

    /// The failure that ended the attempt: the fallback's error for a failed chain.
    pub fn final_failure(&self) -> &CollectError {
        match self {
            CollectError::Fallback { fallback, .. } => fallback.final_failure(),
            other => other,
        }
    }
}
