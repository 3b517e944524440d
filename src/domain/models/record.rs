//! Records under audit: issues and pull requests with their project items.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a record is an issue or a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// An issue.
    Issue,
    /// A pull request.
    PullRequest,
}

impl RecordKind {
    /// Snake-case name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::PullRequest => "pull_request",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four project fields the invariants are stated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectField {
    /// Single-select workflow column.
    Status,
    /// Iteration the record is planned in.
    Cycle,
    /// Single-select flag set on idle records.
    Stale,
    /// Number of times the record moved to a new cycle unfinished.
    Rollovers,
}

impl ProjectField {
    /// Field name as it appears on the project board.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Status => "Status",
            Self::Cycle => "Cycle",
            Self::Stale => "Stale",
            Self::Rollovers => "Rollovers",
        }
    }
}

impl fmt::Display for ProjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value held by a project item field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Selected option of a single-select field.
    SingleSelect { option_id: String, name: String },
    /// Selected iteration of an iteration field.
    Iteration { iteration_id: String, title: String },
    /// Number field value.
    Number(f64),
    /// Text field value.
    Text(String),
}

impl FieldValue {
    /// Single-select option id, if this is a single-select value.
    pub fn option_id(&self) -> Option<&str> {
        match self {
            Self::SingleSelect { option_id, .. } => Some(option_id),
            _ => None,
        }
    }

    /// Iteration id, if this is an iteration value.
    pub fn iteration_id(&self) -> Option<&str> {
        match self {
            Self::Iteration { iteration_id, .. } => Some(iteration_id),
            _ => None,
        }
    }

    /// Numeric value, if this is a number field.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// One membership of a record in a project, with its field values keyed by
/// field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectItem {
    /// Project item id (used for field updates and removal).
    pub id: String,
    /// Id of the project this item belongs to.
    pub project_id: String,
    /// Field values keyed by field name.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl ProjectItem {
    /// An item with no field values.
    pub fn new(id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, field: ProjectField, value: FieldValue) -> Self {
        self.fields.insert(field.name().to_string(), value);
        self
    }

    /// Value of `field`, if set.
    pub fn field(&self, field: ProjectField) -> Option<&FieldValue> {
        self.fields.get(field.name())
    }

    /// Status option id, if any.
    pub fn status(&self) -> Option<&str> {
        self.field(ProjectField::Status).and_then(FieldValue::option_id)
    }

    /// Cycle iteration id, if the item is tagged with a cycle.
    pub fn cycle(&self) -> Option<&str> {
        self.field(ProjectField::Cycle).and_then(FieldValue::iteration_id)
    }

    /// Whether the `Stale` field holds any value.
    pub fn is_stale(&self) -> bool {
        self.field(ProjectField::Stale).is_some()
    }

    /// Rollover counter; absent or non-numeric reads as 0.
    pub fn rollovers(&self) -> u32 {
        self.field(ProjectField::Rollovers)
            .and_then(FieldValue::as_number)
            .filter(|n| n.is_finite() && *n > 0.0)
            .map_or(0, |n| n as u32)
    }
}

/// An issue or pull request under audit, read fresh from the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// GraphQL node id.
    pub id: String,
    /// Issue or pull request.
    pub kind: RecordKind,
    /// Title at fetch time.
    pub title: String,
    /// Web URL.
    pub url: String,
    /// Last activity, as reported by the tracker.
    pub updated_at: DateTime<Utc>,
    /// Login of the author; `None` for deleted accounts.
    #[serde(default)]
    pub author: Option<String>,
    /// Set for issues that an open pull request is going to close. Such
    /// issues are tracked through their pull request and must stay off the
    /// main project.
    #[serde(default)]
    pub has_linked_pull_request: bool,
    /// Every project membership of the record.
    #[serde(default)]
    pub project_items: Vec<ProjectItem>,
}

impl Record {
    /// The record's item in the given project, if it has one.
    pub fn project_item(&self, project_id: &str) -> Option<&ProjectItem> {
        self.project_items
            .iter()
            .find(|item| item.project_id == project_id)
    }

    /// Identifying details for violations and errors.
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
        }
    }
}

/// Identifying details of a record, carried by violations and errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    /// GraphQL node id.
    pub id: String,
    /// Title at fetch time.
    pub title: String,
    /// Web URL.
    pub url: String,
}

impl fmt::Display for RecordSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({})", self.title, self.url)
    }
}

/// Lightweight reference returned when listing open records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    /// GraphQL node id.
    pub id: String,
    /// Issue or pull request.
    pub kind: RecordKind,
}
