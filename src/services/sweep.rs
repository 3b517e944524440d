//! Batch audit of every open issue and pull request in a repository.
//!
//! Records are reconciled independently and concurrently: each outcome is
//! captured on its own and a failing record never stops the others.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::RecordRef;
use crate::domain::ports::RecordRepository;
use crate::services::reconciler::{ReconcileOutcome, ReconcileReport, Reconciler};

/// A record whose reconciliation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    /// Id of the record that failed.
    pub record_id: String,
    /// Rendered error, including its cause chain.
    pub error: String,
}

/// Aggregate result of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepSummary {
    /// Correlation id shared by every log line of the run.
    pub run_id: String,
    /// Records that ended in a consistent state.
    pub consistent: usize,
    /// Records that needed at least one repair.
    pub repaired: usize,
    /// Records that were removed from the project.
    pub removed: usize,
    /// Dry run: records with a planned repair.
    pub planned: usize,
    /// Records whose reconciliation returned an error.
    pub failures: Vec<SweepFailure>,
    /// One report per record that did not fail, ordered by id.
    pub reports: Vec<ReconcileReport>,
}

impl SweepSummary {
    /// Fold one record's result into the summary.
    pub fn add(&mut self, record_id: String, result: DomainResult<ReconcileReport>) {
        match result {
            Ok(report) => {
                if report.repaired() {
                    self.repaired += 1;
                }
                match report.outcome {
                    ReconcileOutcome::Consistent => self.consistent += 1,
                    ReconcileOutcome::Removed => self.removed += 1,
                    ReconcileOutcome::Planned => self.planned += 1,
                }
                self.reports.push(report);
            }
            Err(err) => {
                tracing::error!(record_id = %record_id, error = %err, "reconciliation failed");
                self.failures.push(SweepFailure {
                    record_id,
                    error: err.to_string(),
                });
            }
        }
    }

    /// Every record the sweep touched, failed or not.
    pub fn total(&self) -> usize {
        self.reports.len() + self.failures.len()
    }

    /// Whether any record failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Runs the reconciler over all open records of a repository.
pub struct SweepService {
    repository: Arc<dyn RecordRepository>,
    reconciler: Reconciler,
    concurrency: usize,
}

impl SweepService {
    /// A `concurrency` of zero is treated as one.
    pub fn new(
        repository: Arc<dyn RecordRepository>,
        reconciler: Reconciler,
        concurrency: usize,
    ) -> Self {
        Self {
            repository,
            reconciler,
            concurrency: concurrency.max(1),
        }
    }

    /// List the open records of `owner/repo` and reconcile each one.
    ///
    /// Fails only if the listing itself fails; per-record errors end up in
    /// [`SweepSummary::failures`].
    pub async fn run(&self, owner: &str, repo: &str) -> DomainResult<SweepSummary> {
        let run_id = Uuid::new_v4();
        let full_name = format!("{owner}/{repo}");
        let span = tracing::info_span!("sweep", run_id = %run_id, repo = %full_name);

        async move {
            let refs = self.repository.list_open_records(owner, repo).await?;
            tracing::info!(records = refs.len(), "sweep started");

            let mut summary = self.reconcile_all(refs).await;
            summary.run_id = run_id.to_string();

            tracing::info!(
                consistent = summary.consistent,
                repaired = summary.repaired,
                removed = summary.removed,
                failed = summary.failures.len(),
                "sweep finished"
            );
            Ok(summary)
        }
        .instrument(span)
        .await
    }

    /// Reconcile the given records, up to `concurrency` at a time.
    pub async fn reconcile_all(&self, refs: Vec<RecordRef>) -> SweepSummary {
        let results: Vec<(String, DomainResult<ReconcileReport>)> = stream::iter(refs)
            .map(|r| async move {
                let result = self.reconciler.reconcile_by_id(&r.id).await;
                (r.id, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut summary = SweepSummary::default();
        for (record_id, result) in results {
            summary.add(record_id, result);
        }
        summary.reports.sort_by(|a, b| a.record_id.cmp(&b.record_id));
        summary.failures.sort_by(|a, b| a.record_id.cmp(&b.record_id));
        summary
    }
}
