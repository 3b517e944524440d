//! Reconciliation services.
//!
//! - `invariants`: the four ordered project-state checks
//! - `repair`: violation to corrective action mapping
//! - `reconciler`: the check / repair / refetch loop for one record
//! - `sweep`: concurrent reconciliation of every open record in a repository

pub mod invariants;
pub mod reconciler;
pub mod repair;
pub mod sweep;

pub use reconciler::{ReconcileOutcome, ReconcilePolicy, ReconcileReport, Reconciler, RepairRecord};
pub use repair::{FollowUp, Repair, RepairDispatcher};
pub use sweep::{SweepFailure, SweepService, SweepSummary};
