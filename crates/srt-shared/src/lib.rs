//! Shared types and parsers for the sandbox violation collector.
//!
//! Everything here is pure: no process spawning, no I/O beyond reading from
//! an already-captured buffer. `srtd` owns the sources and collectors.

pub mod error;
pub mod parsers;
pub mod scan;
pub mod violation;
pub mod window;

pub use error::CollectError;
pub use parsers::ParseContext;
pub use scan::{scan_lines, Harvest};
pub use violation::Violation;

/// Deny code used for Linux backends, which rarely expose an errno in text form
pub const LINUX_DENY_CODE: &str = "EPERM";

/// Operation recorded when a sandbox line has no recognizable denial phrase
pub const UNKNOWN_OPERATION: &str = "unknown";
