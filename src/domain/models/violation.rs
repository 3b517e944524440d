//! Project-state invariant violations.
//!
//! Each variant names one broken invariant and carries the record it was
//! found on. The reconciliation loop matches on the variant to pick exactly
//! one repair; violations are values, not errors propagated to callers.

use serde::Serialize;
use thiserror::Error;

use crate::domain::models::record::RecordSummary;

/// A single broken invariant on a record.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum Violation {
    /// An issue closed by an open pull request still sits in the project.
    #[error("{0} has a linked pull request but is in the project")]
    LinkedRecord(RecordSummary),

    /// The record has no item in the project.
    #[error("{0} is not in the project")]
    Stray(RecordSummary),

    /// The project item has no status.
    #[error("{0} has no status")]
    MissingStatus(RecordSummary),

    /// Todo or In progress without a cycle.
    #[error("{0} is planned but has no cycle")]
    NoCycle(RecordSummary),

    /// Todo or In progress carrying a cycle other than the current one.
    #[error("{0} is planned in a previous cycle")]
    PreviousCycle(RecordSummary),

    /// Triage or Backlog carrying a cycle.
    #[error("{0} is unplanned but has a cycle")]
    UnexpectedCycle(RecordSummary),

    /// Idle for a week and not flagged.
    #[error("{0} has not been updated for a week but is not marked stale")]
    Stale(RecordSummary),

    /// Flagged stale but updated within the last week.
    #[error("{0} was updated within a week but is marked stale")]
    NotStale(RecordSummary),
}

impl Violation {
    /// The record the violation was found on.
    pub fn record(&self) -> &RecordSummary {
        match self {
            Self::LinkedRecord(r)
            | Self::Stray(r)
            | Self::MissingStatus(r)
            | Self::NoCycle(r)
            | Self::PreviousCycle(r)
            | Self::UnexpectedCycle(r)
            | Self::Stale(r)
            | Self::NotStale(r) => r,
        }
    }

    /// Stable snake_case name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LinkedRecord(_) => "linked_record",
            Self::Stray(_) => "stray",
            Self::MissingStatus(_) => "missing_status",
            Self::NoCycle(_) => "no_cycle",
            Self::PreviousCycle(_) => "previous_cycle",
            Self::UnexpectedCycle(_) => "unexpected_cycle",
            Self::Stale(_) => "stale",
            Self::NotStale(_) => "not_stale",
        }
    }
}
