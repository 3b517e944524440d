//! Resolved project layout: the ids the reconciliation core works with.
//!
//! A [`ProjectLayout`] is resolved once (from config, from the tracker, or
//! both) and then shared immutably by every reconciliation in a run.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::record::ProjectField;

/// Option ids for the named status columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOptions {
    /// `Triage` option id.
    pub triage: String,
    /// `Backlog` option id.
    pub backlog: String,
    /// `Todo` option id.
    pub todo: String,
    /// `In progress` option id.
    pub in_progress: String,
}

/// Field ids on the main project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIds {
    /// `Status` field id.
    pub status: String,
    /// `Cycle` field id.
    pub cycle: String,
    /// `Stale` field id.
    pub stale: String,
    /// `Rollovers` field id.
    pub rollovers: String,
}

impl FieldIds {
    /// Id of `field`.
    pub fn get(&self, field: ProjectField) -> &str {
        match field {
            ProjectField::Status => &self.status,
            ProjectField::Cycle => &self.cycle,
            ProjectField::Stale => &self.stale,
            ProjectField::Rollovers => &self.rollovers,
        }
    }
}

/// How a status option participates in the cycle invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Triage or Backlog: must not carry a cycle.
    Unplanned,
    /// Todo or In progress: must carry the current cycle.
    Planned,
    /// Any other column (Done, Blocked, ...): unconstrained.
    Other,
}

/// Immutable ids for the main project, its fields, and the current cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLayout {
    /// Node id of the main project.
    pub project_id: String,
    /// Ids of the fields the checks read and write.
    pub fields: FieldIds,
    /// Ids of the status options with cycle rules.
    pub statuses: StatusOptions,
    /// Iteration id of the cycle in progress today.
    pub current_cycle_id: String,
    /// Option id written to the `Stale` field to mark a record stale.
    pub stale_option_id: String,
}

impl ProjectLayout {
    /// Cycle rule that applies to a status option.
    pub fn classify_status(&self, option_id: &str) -> StatusClass {
        if option_id == self.statuses.todo || option_id == self.statuses.in_progress {
            StatusClass::Planned
        } else if option_id == self.statuses.triage || option_id == self.statuses.backlog {
            StatusClass::Unplanned
        } else {
            StatusClass::Other
        }
    }

    /// Whether `iteration_id` is the cycle in progress.
    pub fn is_current_cycle(&self, iteration_id: &str) -> bool {
        iteration_id == self.current_cycle_id
    }

    /// Reject layouts with blank ids; a blank id would make every check pass
    /// or fail vacuously.
    pub fn validate(&self) -> DomainResult<()> {
        let ids = [
            ("project_id", &self.project_id),
            ("fields.status", &self.fields.status),
            ("fields.cycle", &self.fields.cycle),
            ("fields.stale", &self.fields.stale),
            ("fields.rollovers", &self.fields.rollovers),
            ("statuses.triage", &self.statuses.triage),
            ("statuses.backlog", &self.statuses.backlog),
            ("statuses.todo", &self.statuses.todo),
            ("statuses.in_progress", &self.statuses.in_progress),
            ("current_cycle_id", &self.current_cycle_id),
            ("stale_option_id", &self.stale_option_id),
        ];
        for (name, value) in ids {
            if value.trim().is_empty() {
                return Err(DomainError::ValidationFailed(format!(
                    "project layout is missing {name}"
                )));
            }
        }
        Ok(())
    }
}
