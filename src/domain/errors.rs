//! Domain errors for the Shepherd triage bot.

use thiserror::Error;

use crate::domain::models::{RecordSummary, Violation};

/// Domain-level errors that can occur while auditing project state.
///
/// Handled [`Violation`]s never surface here: they are repaired inside the
/// reconciliation loop. Everything in this enum is fatal for the record
/// being processed.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The tracker has no record, item, or project with this id.
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// A repair needed the record's main-project item and found none.
    #[error("Record {record} has no item in the main project")]
    MissingProjectItem { record: RecordSummary },

    /// Layout or input failed validation.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// A payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A tracker call failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The record still violated an invariant after the repair budget ran out.
    #[error("Record {record} did not converge after {attempts} repair attempts (last violation: {last})")]
    NonConverging {
        /// The record being reconciled.
        record: RecordSummary,
        /// Repairs applied before giving up.
        attempts: u32,
        /// Violation still present at the end.
        last: Box<Violation>,
    },
}

/// Result alias used across the domain and service layers.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for DomainError {
    fn from(err: reqwest::Error) -> Self {
        DomainError::ExecutionFailed(format!("HTTP request failed: {err}"))
    }
}
