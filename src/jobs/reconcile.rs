//! Reconciliation pass
//!
//! One pass scans the library, drops entries that already have a completion
//! marker, and pushes each remaining entry through evidence → classify →
//! act → mark, strictly one entry at a time. Marking is unconditional once
//! an entry has been classified, whatever the outcome of its actions.

use std::collections::HashSet;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span};

use crate::services::{
    ActionDispatcher, Classifier, CompletionLedger, EvidenceGatherer, LibraryScanner,
};

/// Tunables for a pass
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    /// Pause after each processed entry to spread collaborator calls
    pub entry_delay: Duration,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            entry_delay: Duration::from_secs(1),
        }
    }
}

/// Counters for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Folders found in the library
    pub scanned: usize,
    /// Folders that already had a marker when the pass started
    pub already_complete: usize,
    /// Entries classified during this pass
    pub processed: usize,
    /// Entries marked by someone else between diff and processing
    pub skipped: usize,
    pub positive: usize,
    pub notified: usize,
    pub deleted: usize,
    /// Markers successfully written
    pub marked: usize,
}

/// Scanner → ledger diff → classifier → dispatcher → ledger
pub struct ReconciliationLoop {
    scanner: LibraryScanner,
    ledger: CompletionLedger,
    gatherer: EvidenceGatherer,
    classifier: Classifier,
    dispatcher: ActionDispatcher,
    settings: ReconcileSettings,
}

impl ReconciliationLoop {
    pub fn new(
        scanner: LibraryScanner,
        ledger: CompletionLedger,
        gatherer: EvidenceGatherer,
        classifier: Classifier,
        dispatcher: ActionDispatcher,
    ) -> Self {
        Self {
            scanner,
            ledger,
            gatherer,
            classifier,
            dispatcher,
            settings: ReconcileSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ReconcileSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn ledger(&self) -> &CompletionLedger {
        &self.ledger
    }

    /// Run one pass over the library
    pub async fn run_pass(&self) -> PassSummary {
        self.run_pass_until(&CancellationToken::new()).await
    }

    /// Run one pass, stopping before the next entry once `cancel` fires.
    ///
    /// An entry that has started always runs through to its marker write.
    pub async fn run_pass_until(&self, cancel: &CancellationToken) -> PassSummary {
        let scanned = self.scanner.list_entries().await;
        let completed = self.ledger.list_completed().await;
        let new_work = pending_entries(&scanned, &completed);

        let mut summary = PassSummary {
            scanned: scanned.len(),
            already_complete: scanned.iter().filter(|n| completed.contains(*n)).count(),
            ..Default::default()
        };
        info!(count = new_work.len(), "Found new movies to check");

        let total = new_work.len();
        for (i, entry) in new_work.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(
                    remaining = total - i,
                    "Shutdown requested, leaving the rest for the next run"
                );
                break;
            }
            let span = info_span!("entry", name = %entry, index = i + 1, total);
            self.process_entry(entry, &mut summary).instrument(span).await;
        }

        info!(
            scanned = summary.scanned,
            already_complete = summary.already_complete,
            processed = summary.processed,
            skipped = summary.skipped,
            positive = summary.positive,
            notified = summary.notified,
            deleted = summary.deleted,
            marked = summary.marked,
            "Processing complete"
        );
        summary
    }

    async fn process_entry(&self, entry: &str, summary: &mut PassSummary) {
        info!("Processing movie");

        // The ledger may have changed since the diff was taken
        if self.ledger.is_complete(entry).await {
            info!("Already checked, skipping");
            summary.skipped += 1;
            return;
        }

        let evidence = self.gatherer.gather(entry).await;
        let positive = self.classifier.classify(entry, &evidence).await;
        summary.processed += 1;

        if positive {
            info!("Identified as Indian movie");
            summary.positive += 1;
            let outcome = self.dispatcher.on_positive(entry).await;
            if outcome.notified {
                summary.notified += 1;
            }
            if outcome.deleted == Some(true) {
                summary.deleted += 1;
            }
        } else {
            info!("Not an Indian movie");
        }

        if self.ledger.mark_complete(entry).await {
            summary.marked += 1;
        }

        if !self.settings.entry_delay.is_zero() {
            tokio::time::sleep(self.settings.entry_delay).await;
        }
    }
}

/// Scanned entries without a marker, in scan order
pub fn pending_entries(scanned: &[String], completed: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    scanned
        .iter()
        .filter(|name| !completed.contains(*name) && seen.insert(name.as_str()))
        .cloned()
        .collect()
}
