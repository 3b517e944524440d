//! Reconciliation loop: check, repair, refetch, until the record is consistent.
//!
//! Each record goes through an explicit state machine:
//!
//! ```text
//! Checking --violation--> Fixing --refetch--> Checking
//!    |                      |
//!    +--consistent--> Done <+--terminal repair
//! ```
//!
//! Any error from the ports, or from planning a repair, ends the loop and is
//! returned to the caller unchanged. No two repairs for the same record are
//! ever in flight at once, and every repair is followed by a fresh read.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::Instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ProjectLayout, Record, Violation};
use crate::domain::ports::{ProjectMutator, RecordRepository};
use crate::services::invariants;
use crate::services::repair::{FollowUp, Repair, RepairDispatcher};

/// Limits and mode for a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Repairs allowed per record before reporting non-convergence.
    pub max_attempts: u32,
    /// Plan the first repair without applying it.
    pub dry_run: bool,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            dry_run: false,
        }
    }
}

/// How reconciliation of a record ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// All checks pass.
    Consistent,
    /// The record was removed from the project; no further checks apply.
    Removed,
    /// Dry run: a repair was planned but not applied.
    Planned,
}

/// A repair together with the violation that caused it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairRecord {
    /// What was wrong.
    pub violation: Violation,
    /// What was done about it.
    pub repair: Repair,
}

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    /// Node id of the record.
    pub record_id: String,
    /// How the loop ended.
    pub outcome: ReconcileOutcome,
    /// Number of check passes run.
    pub passes: u32,
    /// Repairs applied (or, in a dry run, planned) in order.
    pub repairs: Vec<RepairRecord>,
}

impl ReconcileReport {
    fn new(record_id: &str) -> Self {
        Self {
            record_id: record_id.to_string(),
            outcome: ReconcileOutcome::Consistent,
            passes: 0,
            repairs: Vec::new(),
        }
    }

    /// Whether at least one repair was applied, not just planned.
    pub fn repaired(&self) -> bool {
        self.outcome != ReconcileOutcome::Planned && !self.repairs.is_empty()
    }
}

enum LoopState {
    Checking(Record),
    Fixing { record: Record, violation: Violation },
    Done(ReconcileOutcome),
}

/// Drives records to a consistent state against one project layout.
#[derive(Clone)]
pub struct Reconciler {
    repository: Arc<dyn RecordRepository>,
    dispatcher: RepairDispatcher,
    layout: Arc<ProjectLayout>,
    policy: ReconcilePolicy,
}

impl Reconciler {
    /// Reads through `repository` and writes through `mutator`.
    pub fn new(
        repository: Arc<dyn RecordRepository>,
        mutator: Arc<dyn ProjectMutator>,
        layout: Arc<ProjectLayout>,
        policy: ReconcilePolicy,
    ) -> Self {
        Self {
            repository,
            dispatcher: RepairDispatcher::new(mutator, Arc::clone(&layout)),
            layout,
            policy,
        }
    }

    /// Layout every check runs against.
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Attempt cap and dry-run mode.
    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    /// First violation on a record, without repairing anything.
    pub fn inspect(&self, record: &Record) -> Option<Violation> {
        invariants::validate(record, &self.layout, Utc::now()).err()
    }

    /// Fetch a record by id and reconcile it.
    pub async fn reconcile_by_id(&self, id: &str) -> DomainResult<ReconcileReport> {
        let record = self.repository.fetch_record(id).await?;
        self.reconcile(record).await
    }

    /// Fetch a record and reconcile it as having a linked pull request,
    /// whatever the tracker reports. Only project membership is checked.
    pub async fn reconcile_linked_by_id(&self, id: &str) -> DomainResult<ReconcileReport> {
        let mut record = self.repository.fetch_record(id).await?;
        record.has_linked_pull_request = true;
        self.reconcile(record).await
    }

    /// Reconcile a freshly fetched record until it is consistent.
    ///
    /// Returns once all checks pass or a terminal repair was applied.
    /// Fails with [`DomainError::NonConverging`] when more than
    /// `max_attempts` repairs would be needed, and with the underlying
    /// error when a read or write fails.
    pub async fn reconcile(&self, record: Record) -> DomainResult<ReconcileReport> {
        let span = tracing::info_span!("reconcile", record_id = %record.id, kind = %record.kind);
        self.run(record).instrument(span).await
    }

    async fn run(&self, record: Record) -> DomainResult<ReconcileReport> {
        let mut report = ReconcileReport::new(&record.id);
        let mut state = LoopState::Checking(record);

        loop {
            state = match state {
                LoopState::Checking(record) => {
                    report.passes += 1;
                    match invariants::validate(&record, &self.layout, Utc::now()) {
                        Ok(()) => LoopState::Done(ReconcileOutcome::Consistent),
                        Err(violation) => LoopState::Fixing { record, violation },
                    }
                }
                LoopState::Fixing { record, violation } => {
                    self.fix(&mut report, record, violation).await?
                }
                LoopState::Done(outcome) => {
                    report.outcome = outcome;
                    tracing::debug!(
                        outcome = ?outcome,
                        passes = report.passes,
                        repairs = report.repairs.len(),
                        "reconciliation finished"
                    );
                    return Ok(report);
                }
            };
        }
    }

    async fn fix(
        &self,
        report: &mut ReconcileReport,
        record: Record,
        violation: Violation,
    ) -> DomainResult<LoopState> {
        let attempts = u32::try_from(report.repairs.len()).unwrap_or(u32::MAX);
        if attempts >= self.policy.max_attempts {
            tracing::warn!(
                violation = violation.kind(),
                attempts,
                "record did not converge"
            );
            return Err(DomainError::NonConverging {
                record: record.summary(),
                attempts,
                last: Box::new(violation),
            });
        }

        let repair = Repair::plan(&violation, &record, &self.layout)?;

        if self.policy.dry_run {
            tracing::info!(
                violation = violation.kind(),
                repair = repair.name(),
                "dry run: repair planned"
            );
            report.repairs.push(RepairRecord { violation, repair });
            return Ok(LoopState::Done(ReconcileOutcome::Planned));
        }

        tracing::info!(
            violation = violation.kind(),
            repair = %repair,
            attempt = attempts + 1,
            url = %record.url,
            "repairing"
        );
        let follow_up = self.dispatcher.apply(&repair).await?;
        report.repairs.push(RepairRecord { violation, repair });

        Ok(match follow_up {
            FollowUp::Refetch => {
                LoopState::Checking(self.repository.fetch_record(&record.id).await?)
            }
            FollowUp::Done => LoopState::Done(ReconcileOutcome::Removed),
        })
    }
}
