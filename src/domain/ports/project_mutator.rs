//! Write port for the main project.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::errors::DomainResult;
use crate::domain::models::{FieldValue, ProjectField};

/// One field write on a project item; `value: None` clears the field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldUpdate {
    /// Field to write.
    pub field: ProjectField,
    /// New value, or `None` to clear.
    pub value: Option<FieldValue>,
}

impl FieldUpdate {
    /// Write `value` to `field`.
    pub fn set(field: ProjectField, value: FieldValue) -> Self {
        Self {
            field,
            value: Some(value),
        }
    }

    /// Clear `field`.
    pub fn clear(field: ProjectField) -> Self {
        Self { field, value: None }
    }
}

/// Write port for the main project
///
/// Every operation must be idempotent: applying it twice leaves the same
/// state as applying it once.
#[async_trait]
pub trait ProjectMutator: Send + Sync {
    /// Add a record to the main project, returning the new item id.
    async fn add_to_project(&self, record_id: &str) -> DomainResult<String>;

    /// Remove a project item from the main project.
    async fn remove_from_project(&self, item_id: &str) -> DomainResult<()>;

    /// Apply field updates to a project item, in order.
    async fn set_fields(&self, item_id: &str, updates: &[FieldUpdate]) -> DomainResult<()>;
}
