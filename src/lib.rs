//! Shepherd - triage bot for GitHub projects
//!
//! Shepherd keeps every open issue and pull request of a repository
//! consistent with a single "main" GitHub project: each record is in the
//! project, has a status, carries the current cycle when planned, and is
//! flagged stale after a week without activity.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): records, project layout, violations, ports
//! - **Service Layer** (`services`): invariant checks, repairs, reconciliation loop, sweep
//! - **Adapters** (`adapters`): GitHub GraphQL tracker and an in-memory tracker
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use shepherd::{InMemoryTracker, ReconcilePolicy, Reconciler};
//!
//! let tracker = Arc::new(InMemoryTracker::new("PVT_main"));
//! let reconciler = Reconciler::new(tracker.clone(), tracker, Arc::new(layout), ReconcilePolicy::default());
//! let report = reconciler.reconcile_by_id("I_kwDOA").await?;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::{GitHubProjectTracker, InMemoryTracker};
pub use domain::models::{
    Config, FieldValue, ProjectField, ProjectItem, ProjectLayout, Record, RecordKind,
    RecordSummary, Violation,
};
pub use domain::ports::{FieldUpdate, ProjectMutator, RecordRepository};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    ReconcileOutcome, ReconcilePolicy, ReconcileReport, Reconciler, Repair, SweepService,
    SweepSummary,
};
