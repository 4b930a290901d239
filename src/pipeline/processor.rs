//! Document router — drives one batch sweep end-to-end.
//!
//! Flow per record:
//! 1. Rule evaluation (pure, total)
//! 2. File relocation (non-fatal on failure)
//! 3. Outcome write-back with the processed marker
//!
//! The unprocessed-filter in the store is the sole idempotency guard:
//! a record marked processed is never fetched, evaluated, or moved again.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::RouterConfig;
use crate::error::Error;
use crate::pipeline::relocate::Archive;
use crate::pipeline::rules::RuleSet;
use crate::pipeline::types::DocumentRecord;
use crate::store::traits::{DocumentStore, RoutingOutcome};

/// Counters for one sweep. `processed == 0` is a valid, non-error outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records evaluated and persisted back to the store.
    pub processed: usize,
    /// Files physically moved into the archive.
    pub moved: usize,
    /// Relocations that failed (missing source, I/O). These records are
    /// still marked processed, with `routing_error` set.
    pub failed_moves: usize,
}

/// Orchestrates fetch → evaluate → move → persist over the unprocessed set.
pub struct DocumentRouter {
    store: Arc<dyn DocumentStore>,
    archive: Archive,
    rules: RuleSet,
}

impl DocumentRouter {
    /// Create a router from its parts.
    pub fn new(store: Arc<dyn DocumentStore>, archive: Archive, rules: RuleSet) -> Self {
        Self {
            store,
            archive,
            rules,
        }
    }

    /// Create a router with the default rule set configured from `config`.
    pub fn from_config(config: &RouterConfig, store: Arc<dyn DocumentStore>) -> Self {
        let mut rules = RuleSet::default_rules();
        if let Some(threshold) = config.review_below {
            rules = rules.with_review_below(threshold);
        }
        Self::new(store, Archive::new(config.archive_root.clone()), rules)
    }

    /// Run one batch sweep over all currently-unprocessed documents.
    ///
    /// Store failures are fatal and propagate; per-record relocation or
    /// write-back failures are logged and the sweep continues. A record
    /// whose write-back failed is not counted as processed and will be
    /// picked up again by the next run.
    pub async fn run(&self) -> Result<RunSummary, Error> {
        self.archive.ensure_folders().await?;

        let total = self.store.count_documents().await?;
        info!(total, "Connected to document store");

        let unrouted = self.store.fetch_unrouted().await?;
        if unrouted.is_empty() {
            info!("No new documents to route");
            return Ok(RunSummary::default());
        }
        info!(count = unrouted.len(), "Found unprocessed documents");

        let mut summary = RunSummary::default();
        for doc in unrouted {
            let record = DocumentRecord::from_stored(doc);
            let decision = self.rules.evaluate(&record);
            info!(
                id = %record.id,
                file = %record.file_name,
                class = record.document_class.as_deref().unwrap_or("<none>"),
                folder = decision.target_folder,
                "Routing document"
            );

            let routing_error = match self
                .archive
                .move_into(&record.file_path, &record.file_name, decision.target_folder)
                .await
            {
                Ok(_) => {
                    summary.moved += 1;
                    None
                }
                Err(e) => {
                    warn!(
                        id = %record.id,
                        file = %record.file_name,
                        error = %e,
                        "Relocation failed, recording error marker"
                    );
                    summary.failed_moves += 1;
                    Some(e.to_string())
                }
            };

            let outcome = RoutingOutcome {
                target_folder: decision.target_folder.to_string(),
                needs_review: decision.needs_review,
                ocr_failed: decision.ocr_failed,
                routing_error,
                routed_at: Utc::now(),
            };

            match self.store.mark_routed(&record.id, &outcome).await {
                Ok(()) => summary.processed += 1,
                Err(e) => {
                    // Not marked processed — the next run retries this one.
                    error!(
                        id = %record.id,
                        file = %record.file_name,
                        error = %e,
                        "Failed to persist routing outcome"
                    );
                }
            }
        }

        info!(
            processed = summary.processed,
            moved = summary.moved,
            failed_moves = summary.failed_moves,
            "Routing sweep complete"
        );
        Ok(summary)
    }
}
