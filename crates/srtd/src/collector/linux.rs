//! Linux collector: systemd journal first, kernel ring buffer as fallback.

use super::Collector;
use crate::sources::{CommandSource, LogSource};
use srt_shared::parsers::{dmesg, journal};
use srt_shared::{CollectError, Harvest, ParseContext};
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct LinuxCollector {
    primary: Box<dyn LogSource>,
    fallback: Box<dyn LogSource>,
}

impl LinuxCollector {
    pub fn new() -> Self {
        Self::with_sources(
            Box::new(CommandSource::journalctl()),
            Box::new(CommandSource::dmesg()),
        )
    }

    /// `primary` output is parsed as journal text, `fallback` as `dmesg -T` text
    pub fn with_sources(primary: Box<dyn LogSource>, fallback: Box<dyn LogSource>) -> Self {
        Self { primary, fallback }
    }

    fn collect_from_fallback(
        &self,
        since: Duration,
        ctx: &ParseContext,
        primary_err: CollectError,
    ) -> Result<Harvest, CollectError> {
        warn!(
            "{} unavailable, falling back to {}: {}",
            self.primary.name(),
            self.fallback.name(),
            primary_err
        );

        let output = self
            .fallback
            .read(since)
            .map_err(|fallback_err| CollectError::Fallback {
                primary: Box::new(primary_err),
                fallback: Box::new(fallback_err),
            })?;

        let mut harvest = dmesg::parse_output(Cursor::new(output), ctx);

        // The ring buffer has no portable --since; drop what predates the window
        if let Some(start) = ctx.window_start() {
            let before = harvest.len();
            harvest.retain(|v| v.timestamp >= start);
            debug!(
                "Dropped {} {} violations older than the window",
                before - harvest.len(),
                self.fallback.name()
            );
        }

        Ok(harvest)
    }
}

impl Default for LinuxCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for LinuxCollector {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn collect_violations(&self, since: Duration) -> Result<Harvest, CollectError> {
        let ctx = ParseContext::now().with_lookback(since);

        let (harvest, source) = match self.primary.read(since) {
            Ok(output) => (
                journal::parse_output(Cursor::new(output), &ctx),
                self.primary.name(),
            ),
            Err(primary_err) if primary_err.is_source_unavailable() => (
                self.collect_from_fallback(since, &ctx, primary_err)?,
                self.fallback.name(),
            ),
            Err(other) => return Err(other),
        };

        if let Some(fault) = &harvest.fault {
            warn!("{}: {}", source, fault);
        }
        info!("Collected {} sandbox violations from {}", harvest.len(), source);
        Ok(harvest)
    }
}
