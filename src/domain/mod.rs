//! Domain layer for the Shepherd triage bot
//!
//! This module contains the project-state model, the violation taxonomy and
//! the port traits the reconciliation core depends on.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
