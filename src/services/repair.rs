//! Repair dispatch: one corrective action per violation.
//!
//! [`Repair::plan`] turns a [`Violation`] into the single action that clears
//! it; [`RepairDispatcher::apply`] performs that action through the
//! [`ProjectMutator`] port and says whether the loop must refetch.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{FieldValue, ProjectField, ProjectLayout, Record, Violation};
use crate::domain::ports::{FieldUpdate, ProjectMutator};

/// A corrective action against the main project.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Repair {
    /// Delete the record's item from the project. Terminal.
    RemoveFromProject {
        /// Project item to delete.
        item_id: String,
    },
    /// Add the record to the project.
    AddToProject {
        /// Issue or pull request node id.
        record_id: String,
    },
    /// Set `Status` to Triage.
    SetTriage {
        /// Project item to update.
        item_id: String,
    },
    /// Set `Cycle` to the current cycle.
    SetCurrentCycle {
        /// Project item to update.
        item_id: String,
    },
    /// Move to the current cycle and bump `Rollovers`.
    RollOver {
        /// Project item to update.
        item_id: String,
        /// New counter value.
        rollovers: u32,
    },
    /// Clear `Cycle`.
    ClearCycle {
        /// Project item to update.
        item_id: String,
    },
    /// Set the `Stale` flag.
    MarkStale {
        /// Project item to update.
        item_id: String,
    },
    /// Clear the `Stale` flag.
    ClearStale {
        /// Project item to update.
        item_id: String,
    },
}

/// What the loop does after a repair has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Re-read the record and run the checks again.
    Refetch,
    /// Nothing more to do for this record.
    Done,
}

impl Repair {
    /// Choose the repair for a violation found on `record`.
    ///
    /// Field repairs need the record's main-project item; its absence here
    /// means the record changed shape between check and plan, which is not
    /// something a repair can fix.
    pub fn plan(violation: &Violation, record: &Record, layout: &ProjectLayout) -> DomainResult<Self> {
        let item = move || {
            record
                .project_item(&layout.project_id)
                .ok_or_else(|| DomainError::MissingProjectItem {
                    record: record.summary(),
                })
        };

        Ok(match violation {
            Violation::Stray(_) => Self::AddToProject {
                record_id: record.id.clone(),
            },
            Violation::LinkedRecord(_) => Self::RemoveFromProject {
                item_id: item()?.id.clone(),
            },
            Violation::MissingStatus(_) => Self::SetTriage {
                item_id: item()?.id.clone(),
            },
            Violation::NoCycle(_) => Self::SetCurrentCycle {
                item_id: item()?.id.clone(),
            },
            Violation::PreviousCycle(_) => {
                let item = item()?;
                Self::RollOver {
                    item_id: item.id.clone(),
                    rollovers: item.rollovers().saturating_add(1),
                }
            }
            Violation::UnexpectedCycle(_) => Self::ClearCycle {
                item_id: item()?.id.clone(),
            },
            Violation::Stale(_) => Self::MarkStale {
                item_id: item()?.id.clone(),
            },
            Violation::NotStale(_) => Self::ClearStale {
                item_id: item()?.id.clone(),
            },
        })
    }

    /// Whether the loop refetches after this repair or stops.
    pub fn follow_up(&self) -> FollowUp {
        match self {
            Self::RemoveFromProject { .. } => FollowUp::Done,
            _ => FollowUp::Refetch,
        }
    }

    /// Stable snake_case name, used as a structured log field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RemoveFromProject { .. } => "remove_from_project",
            Self::AddToProject { .. } => "add_to_project",
            Self::SetTriage { .. } => "set_triage",
            Self::SetCurrentCycle { .. } => "set_current_cycle",
            Self::RollOver { .. } => "roll_over",
            Self::ClearCycle { .. } => "clear_cycle",
            Self::MarkStale { .. } => "mark_stale",
            Self::ClearStale { .. } => "clear_stale",
        }
    }

    /// The field writes this repair makes, resolved against the layout.
    /// Empty for membership repairs.
    pub fn field_updates(&self, layout: &ProjectLayout) -> Vec<FieldUpdate> {
        let current_cycle = || FieldValue::Iteration {
            iteration_id: layout.current_cycle_id.clone(),
            title: String::new(),
        };
        match self {
            Self::RemoveFromProject { .. } | Self::AddToProject { .. } => Vec::new(),
            Self::SetTriage { .. } => vec![FieldUpdate::set(
                ProjectField::Status,
                FieldValue::SingleSelect {
                    option_id: layout.statuses.triage.clone(),
                    name: String::new(),
                },
            )],
            Self::SetCurrentCycle { .. } => {
                vec![FieldUpdate::set(ProjectField::Cycle, current_cycle())]
            }
            Self::RollOver { rollovers, .. } => vec![
                FieldUpdate::set(ProjectField::Cycle, current_cycle()),
                FieldUpdate::set(ProjectField::Rollovers, FieldValue::Number(f64::from(*rollovers))),
            ],
            Self::ClearCycle { .. } => vec![FieldUpdate::clear(ProjectField::Cycle)],
            Self::MarkStale { .. } => vec![FieldUpdate::set(
                ProjectField::Stale,
                FieldValue::SingleSelect {
                    option_id: layout.stale_option_id.clone(),
                    name: String::new(),
                },
            )],
            Self::ClearStale { .. } => vec![FieldUpdate::clear(ProjectField::Stale)],
        }
    }
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RollOver { rollovers, .. } => write!(f, "roll_over (rollovers={rollovers})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Applies repairs through the mutator port.
#[derive(Clone)]
pub struct RepairDispatcher {
    mutator: Arc<dyn ProjectMutator>,
    layout: Arc<ProjectLayout>,
}

impl RepairDispatcher {
    /// Dispatcher writing through `mutator` with ids from `layout`.
    pub fn new(mutator: Arc<dyn ProjectMutator>, layout: Arc<ProjectLayout>) -> Self {
        Self { mutator, layout }
    }

    /// Perform one repair and report how the loop continues.
    pub async fn apply(&self, repair: &Repair) -> DomainResult<FollowUp> {
        match repair {
            Repair::RemoveFromProject { item_id } => {
                self.mutator.remove_from_project(item_id).await?;
            }
            Repair::AddToProject { record_id } => {
                let item_id = self.mutator.add_to_project(record_id).await?;
                tracing::debug!(record_id = %record_id, item_id = %item_id, "added to project");
            }
            Repair::SetTriage { item_id }
            | Repair::SetCurrentCycle { item_id }
            | Repair::RollOver { item_id, .. }
            | Repair::ClearCycle { item_id }
            | Repair::MarkStale { item_id }
            | Repair::ClearStale { item_id } => {
                let updates = repair.field_updates(&self.layout);
                self.mutator.set_fields(item_id, &updates).await?;
            }
        }
        Ok(repair.follow_up())
    }
}
