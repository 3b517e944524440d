//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interfaces the reconciliation core
//! consumes:
//! - RecordRepository: strongly consistent reads of records and their project items
//! - ProjectMutator: idempotent writes against the main project
//!
//! Adapters (GitHub GraphQL, in-memory) implement these so the core never
//! talks to the tracker directly.

pub mod project_mutator;
pub mod record_repository;

pub use project_mutator::{FieldUpdate, ProjectMutator};
pub use record_repository::RecordRepository;
