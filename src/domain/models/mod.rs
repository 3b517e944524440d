//! Domain models.

pub mod config;
pub mod layout;
pub mod record;
pub mod violation;

pub use config::{
    Config, GitHubConfig, LayoutOverrides, LoggingConfig, ProjectConfig, ReconcileConfig,
    RetryConfig, StatusNames,
};
pub use layout::{FieldIds, ProjectLayout, StatusClass, StatusOptions};
pub use record::{
    FieldValue, ProjectField, ProjectItem, Record, RecordKind, RecordRef, RecordSummary,
};
pub use violation::Violation;
