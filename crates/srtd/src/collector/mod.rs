//! Platform collectors behind a single `Collector` capability.
//!
//! One implementation per host backend, chosen once at startup by
//! [`select_collector`]. Shared parsing code never branches on platform.

pub mod darwin;
pub mod linux;

pub use darwin::DarwinCollector;
pub use linux::LinuxCollector;

use serde::{Deserialize, Serialize};
use srt_shared::{CollectError, Harvest};
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Collects sandbox violations for a lookback window.
///
/// Retrieval errors are returned as `Err`; a mid-scan fault comes back in
/// `Harvest::fault` with the violations read before it. Implementations
/// hold no mutable state and never swallow errors into an empty success.
pub trait Collector: Send + Sync {
    fn name(&self) -> &'static str;

    fn collect_violations(&self, since: Duration) -> Result<Harvest, CollectError>;
}

/// Which collector variant to run
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Pick from the build target
    #[default]
    Auto,
    Macos,
    Linux,
}

impl Backend {
    /// Concrete backend, or `None` when the host has no collector
    pub fn resolve(self) -> Option<Backend> {
        match self {
            Backend::Auto => host_backend(),
            explicit => Some(explicit),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Auto => write!(f, "auto"),
            Backend::Macos => write!(f, "macos"),
            Backend::Linux => write!(f, "linux"),
        }
    }
}

#[cfg(target_os = "macos")]
fn host_backend() -> Option<Backend> {
    Some(Backend::Macos)
}

#[cfg(target_os = "linux")]
fn host_backend() -> Option<Backend> {
    Some(Backend::Linux)
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn host_backend() -> Option<Backend> {
    None
}

/// Build the collector for `backend`. Call once at startup.
pub fn select_collector(backend: Backend) -> Box<dyn Collector> {
    let collector: Box<dyn Collector> = match backend.resolve() {
        Some(Backend::Macos) => Box::new(DarwinCollector::new()),
        Some(Backend::Linux) => Box::new(LinuxCollector::new()),
        Some(Backend::Auto) | None => Box::new(UnsupportedCollector::new(std::env::consts::OS)),
    };
    info!("Using {} collector (requested: {})", collector.name(), backend);
    collector
}

/// Stand-in for hosts without a log backend; every call fails
#[derive(Debug, Clone)]
pub struct UnsupportedCollector {
    platform: String,
}

impl UnsupportedCollector {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
        }
    }
}

impl Collector for UnsupportedCollector {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn collect_violations(&self, _since: Duration) -> Result<Harvest, CollectError> {
        Err(CollectError::Unsupported {
            platform: self.platform.clone(),
        })
    }
}
