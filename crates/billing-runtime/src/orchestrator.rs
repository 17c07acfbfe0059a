//! Concurrent consolidation.
//!
//! Each workbook is processed by a `spawn_blocking` worker that owns its
//! bytes for the duration of the job. A semaphore bounds how many run at
//! once. Results are awaited in upload order and folded into a single
//! [`OutcomeBuilder`] held by the merge loop, so the outcome is identical to
//! sequential [`consolidate`](billing_data::consolidate) for any worker count.

use std::sync::Arc;

use billing_core::settings::MAX_WORKERS;
use billing_data::pipeline::{process_workbook, ConsolidationOutcome, OutcomeBuilder};
use billing_data::reader::WorkbookInput;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info};

// ── Public types ──────────────────────────────────────────────────────────────

/// Emitted once per workbook as it is merged, in upload order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// One-based position in the upload order.
    pub index: usize,
    pub total: usize,
    pub workbook: String,
    pub succeeded: bool,
}

// ── ConsolidationOrchestrator ─────────────────────────────────────────────────

/// Bounded worker pool for workbook processing.
#[derive(Debug, Clone)]
pub struct ConsolidationOrchestrator {
    workers: usize,
}

impl ConsolidationOrchestrator {
    /// Create an orchestrator running at most `workers` jobs at once
    /// (clamped to `1..=MAX_WORKERS`).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.clamp(1, MAX_WORKERS),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every input and return the merged outcome.
    pub async fn run(&self, inputs: Vec<WorkbookInput>) -> ConsolidationOutcome {
        self.run_with_progress(inputs, None).await
    }

    /// Like [`run`](Self::run), sending a [`ProgressEvent`] per merged
    /// workbook. A dropped receiver is ignored.
    pub async fn run_with_progress(
        &self,
        inputs: Vec<WorkbookInput>,
        progress: Option<mpsc::UnboundedSender<ProgressEvent>>,
    ) -> ConsolidationOutcome {
        let total = inputs.len();
        info!(workbooks = total, workers = self.workers, "consolidation started");

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(total);

        for input in inputs {
            // The semaphore is never closed, so acquisition only waits.
            let permit = Arc::clone(&semaphore).acquire_owned().await.ok();
            let workbook = input.filename.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let WorkbookInput { filename, bytes } = input;
                process_workbook(&filename, &bytes)
            });
            handles.push((workbook, handle));
        }

        let mut builder = OutcomeBuilder::new();
        for (i, (workbook, handle)) in handles.into_iter().enumerate() {
            let succeeded = match handle.await {
                Ok(result) => {
                    let succeeded = result.is_ok();
                    builder.record(&workbook, result);
                    succeeded
                }
                Err(e) => {
                    builder.record_failure(&workbook, format!("worker failed: {e}"));
                    false
                }
            };
            debug!(workbook = %workbook, succeeded, "merged {}/{}", i + 1, total);

            if let Some(tx) = &progress {
                let _ = tx.send(ProgressEvent {
                    index: i + 1,
                    total,
                    workbook,
                    succeeded,
                });
            }
        }

        let outcome = builder.finish();
        info!(
            rows = outcome.dataset.rows.len(),
            sheets = outcome.dataset.summaries.len(),
            failures = outcome.failures.len(),
            "consolidation finished"
        );
        outcome
    }
}

impl Default for ConsolidationOrchestrator {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(workers)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
