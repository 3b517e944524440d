//! GitHub GraphQL response models.
//!
//! These structs map to the GraphQL API v4 JSON payloads for the queries in
//! [`super::queries`]. They are internal to the GitHub adapter; conversion
//! into domain types happens here so the tracker stays thin.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{FieldValue, ProjectItem, Record, RecordKind};

/// Envelope of every GraphQL response.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    /// Machine-readable error type, e.g. `NOT_FOUND` or `RATE_LIMITED`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl GraphQlError {
    pub fn is_not_found(&self) -> bool {
        self.kind.as_deref() == Some("NOT_FOUND")
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind.as_deref() == Some("RATE_LIMITED")
    }
}

/// `nodes` list of a connection.
#[derive(Debug, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

/// Paginated connection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedConnection<T> {
    #[serde(default)]
    pub page_info: PageInfo,
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct IdNode {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct Actor {
    pub login: String,
}

// ── fetch record ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NodeData {
    pub node: Option<RecordNode>,
}

/// An `Issue` or `PullRequest` node.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordNode {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub id: String,
    pub title: String,
    pub url: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<Actor>,
    /// Only requested on issues.
    #[serde(default)]
    pub closed_by_pull_requests_references: Option<TotalCount>,
    pub project_items: PagedConnection<ItemNode>,
}

impl RecordNode {
    /// Cursor of the next page of project items, if there is one.
    pub fn next_items_cursor(&self) -> Option<String> {
        let page = &self.project_items.page_info;
        if page.has_next_page {
            page.end_cursor.clone()
        } else {
            None
        }
    }


    pub fn into_record(self) -> DomainResult<Record> {
        let kind = match self.typename.as_str() {
            "Issue" => RecordKind::Issue,
            "PullRequest" => RecordKind::PullRequest,
            other => {
                return Err(DomainError::ValidationFailed(format!(
                    "node {} is a {other}, not an issue or pull request",
                    self.id
                )))
            }
        };
        let has_linked_pull_request = kind == RecordKind::Issue
            && self
                .closed_by_pull_requests_references
                .is_some_and(|refs| refs.total_count > 0);

        Ok(Record {
            id: self.id,
            kind,
            title: self.title,
            url: self.url,
            updated_at: self.updated_at,
            author: self.author.map(|a| a.login),
            has_linked_pull_request,
            project_items: self
                .project_items
                .nodes
                .into_iter()
                .map(ItemNode::into_project_item)
                .collect(),
        })
    }
}

/// A `ProjectV2Item` with its field values.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemNode {
    pub id: String,
    pub project: IdNode,
    pub field_values: Connection<FieldValueNode>,
}

impl ItemNode {
    fn into_project_item(self) -> ProjectItem {
        let mut item = ProjectItem::new(self.id, self.project.id);
        for node in self.field_values.nodes {
            if let Some((name, value)) = node.into_named_value() {
                item.fields.insert(name, value);
            }
        }
        item
    }
}

#[derive(Debug, Deserialize)]
pub struct FieldRef {
    pub name: String,
}

/// A `ProjectV2ItemFieldValue` union member.
#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub enum FieldValueNode {
    #[serde(rename = "ProjectV2ItemFieldSingleSelectValue", rename_all = "camelCase")]
    SingleSelect {
        option_id: Option<String>,
        name: Option<String>,
        field: Option<FieldRef>,
    },
    #[serde(rename = "ProjectV2ItemFieldIterationValue", rename_all = "camelCase")]
    Iteration {
        iteration_id: String,
        title: String,
        field: Option<FieldRef>,
    },
    #[serde(rename = "ProjectV2ItemFieldNumberValue")]
    Number {
        number: Option<f64>,
        field: Option<FieldRef>,
    },
    #[serde(rename = "ProjectV2ItemFieldTextValue")]
    Text {
        text: Option<String>,
        field: Option<FieldRef>,
    },
    #[serde(other)]
    Other,
}

impl FieldValueNode {
    /// Field name and value, for the value kinds the audit reads.
    pub fn into_named_value(self) -> Option<(String, FieldValue)> {
        match self {
            Self::SingleSelect {
                option_id,
                name,
                field,
            } => Some((
                field?.name,
                FieldValue::SingleSelect {
                    option_id: option_id?,
                    name: name.unwrap_or_default(),
                },
            )),
            Self::Iteration {
                iteration_id,
                title,
                field,
            } => Some((field?.name, FieldValue::Iteration { iteration_id, title })),
            Self::Number { number, field } => Some((field?.name, FieldValue::Number(number?))),
            Self::Text { text, field } => Some((field?.name, FieldValue::Text(text?))),
            Self::Other => None,
        }
    }
}

// ── list open records ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OpenIssuesData {
    pub repository: Option<OpenIssuesRepository>,
}

#[derive(Debug, Deserialize)]
pub struct OpenIssuesRepository {
    pub issues: PagedConnection<IdNode>,
}

#[derive(Debug, Deserialize)]
pub struct OpenPullRequestsData {
    pub repository: Option<OpenPullRequestsRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPullRequestsRepository {
    pub pull_requests: PagedConnection<IdNode>,
}

// ── mutations ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemData {
    pub add_project_v2_item_by_id: AddItemPayload,
}

#[derive(Debug, Deserialize)]
pub struct AddItemPayload {
    pub item: IdNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItemData {
    pub delete_project_v2_item: DeleteItemPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItemPayload {
    pub deleted_item_id: Option<String>,
}

/// Shared by the update and clear field mutations, which both return the
/// touched item. Only success matters.
#[derive(Debug, Deserialize)]
pub struct FieldMutationData {}

// ── project layout ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProjectOwnerData {
    #[serde(alias = "user")]
    pub organization: Option<ProjectOwner>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOwner {
    pub project_v2: Option<ProjectNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectNode {
    pub id: String,
    pub fields: Connection<ProjectFieldNode>,
}

/// A `ProjectV2FieldConfiguration` union member.
#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub enum ProjectFieldNode {
    #[serde(rename = "ProjectV2Field")]
    Plain { id: String, name: String },
    #[serde(rename = "ProjectV2SingleSelectField")]
    SingleSelect {
        id: String,
        name: String,
        options: Vec<SelectOption>,
    },
    #[serde(rename = "ProjectV2IterationField")]
    Iteration {
        id: String,
        name: String,
        configuration: IterationConfiguration,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectOption {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationConfiguration {
    #[serde(default)]
    pub iterations: Vec<IterationNode>,
    #[serde(default)]
    pub completed_iterations: Vec<IterationNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationNode {
    pub id: String,
    pub title: String,
    pub start_date: NaiveDate,
    /// Length in days.
    pub duration: i64,
}

impl IterationNode {
    /// Whether `day` falls in `[start_date, start_date + duration)`.
    /// A window whose end does not fit in a date contains nothing.
    pub fn contains(&self, day: NaiveDate) -> bool {
        chrono::Duration::try_days(self.duration)
            .and_then(|d| self.start_date.checked_add_signed(d))
            .is_some_and(|end| self.start_date <= day && day < end)
    }
}
