//! macOS collector: unified logging via `log show`, no fallback.

use super::Collector;
use crate::sources::{CommandSource, LogSource};
use srt_shared::parsers::darwin;
use srt_shared::{CollectError, Harvest, ParseContext};
use std::io::Cursor;
use std::time::Duration;
use tracing::{info, warn};

pub struct DarwinCollector {
    source: Box<dyn LogSource>,
}

impl DarwinCollector {
    pub fn new() -> Self {
        Self::with_source(Box::new(CommandSource::log_show()))
    }

    pub fn with_source(source: Box<dyn LogSource>) -> Self {
        Self { source }
    }
}

impl Default for DarwinCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for DarwinCollector {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn collect_violations(&self, since: Duration) -> Result<Harvest, CollectError> {
        // Retrieval failure is fatal here: there is no second source
        let output = self.source.read(since)?;

        let ctx = ParseContext::now().with_lookback(since);
        let harvest = darwin::parse_output(Cursor::new(output), &ctx);

        if let Some(fault) = &harvest.fault {
            warn!("{}: {}", self.source.name(), fault);
        }
        info!(
            "Collected {} sandbox violations from {}",
            harvest.len(),
            self.source.name()
        );
        Ok(harvest)
    }
}
