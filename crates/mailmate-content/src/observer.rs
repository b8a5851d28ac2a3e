//! Throttled page scanning.
//!
//! Mutation batches are coalesced by a leading-edge throttle: the first
//! relevant batch scans immediately, batches inside the window are
//! dropped, and the next batch after the window scans again.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::dom::{Document, Mutation};
use crate::injector::ToolInjector;
use crate::strategy::ExtractionStrategy;

/// Outcome of one scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub injected: usize,
    pub already_marked: usize,
    pub invalid: usize,
    pub failed: usize,
}

impl ScanReport {
    pub fn surfaces(&self) -> usize {
        self.injected + self.already_marked + self.invalid + self.failed
    }
}

pub struct DomObserverEngine {
    strategy: Arc<dyn ExtractionStrategy>,
    injector: Arc<ToolInjector>,
    throttle: Duration,
    last_scan: Mutex<Option<Instant>>,
}

impl DomObserverEngine {
    pub fn new(
        strategy: Arc<dyn ExtractionStrategy>,
        injector: Arc<ToolInjector>,
        throttle: Duration,
    ) -> Self {
        Self {
            strategy,
            injector,
            throttle,
            last_scan: Mutex::new(None),
        }
    }

    /// Feed one mutation batch. Returns the scan report when the batch
    /// was relevant and outside the throttle window.
    pub fn on_mutations(
        &self,
        doc: &mut Document,
        batch: &[Mutation],
        usable: bool,
    ) -> Option<ScanReport> {
        if !batch.iter().any(Mutation::is_relevant) {
            return None;
        }

        {
            let now = Instant::now();
            let mut last = self.last_scan.lock();
            if let Some(previous) = *last {
                if now.duration_since(previous) < self.throttle {
                    debug!(mutations = batch.len(), "Scan throttled, batch dropped");
                    return None;
                }
            }
            *last = Some(now);
        }

        Some(self.scan(doc, usable))
    }

    /// Inject clusters on every unmarked, valid surface.
    pub fn scan(&self, doc: &mut Document, usable: bool) -> ScanReport {
        let mut report = ScanReport::default();

        for surface in self.strategy.locate_surfaces(doc) {
            if self.injector.is_marked(doc, surface.node) {
                report.already_marked += 1;
                continue;
            }
            if !self.strategy.is_valid(doc, &surface) {
                report.invalid += 1;
                continue;
            }
            match self
                .injector
                .inject(doc, self.strategy.as_ref(), &surface, usable)
            {
                Ok(_) => report.injected += 1,
                Err(e) => {
                    warn!(
                        surface = %surface.kind,
                        node = %surface.node,
                        error = %e,
                        "Tool injection failed"
                    );
                    report.failed += 1;
                }
            }
        }

        if report.injected > 0 || report.failed > 0 {
            debug!(
                strategy = self.strategy.name(),
                injected = report.injected,
                already_marked = report.already_marked,
                invalid = report.invalid,
                failed = report.failed,
                "Scan complete"
            );
        }
        report
    }
}
