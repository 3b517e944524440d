//! Project tracker backed by the GitHub GraphQL API.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{FieldValue, ProjectLayout, Record, RecordKind, RecordRef};
use crate::domain::ports::{FieldUpdate, ProjectMutator, RecordRepository};

use super::client::GitHubClient;
use super::models::{
    AddItemData, DeleteItemData, FieldMutationData, IdNode, NodeData, OpenIssuesData,
    OpenPullRequestsData, PagedConnection, RecordNode,
};
use super::queries;

/// Reads records and writes the main project through GitHub.
pub struct GitHubProjectTracker {
    client: Arc<GitHubClient>,
    layout: Arc<ProjectLayout>,
}

impl GitHubProjectTracker {
    /// Tracker writing to the project described by `layout`.
    pub fn new(client: Arc<GitHubClient>, layout: Arc<ProjectLayout>) -> Self {
        Self { client, layout }
    }

    async fn fetch_node(&self, id: &str, items_cursor: Option<&str>) -> DomainResult<RecordNode> {
        let data: NodeData = self
            .client
            .graphql(
                "fetch_record",
                &queries::fetch_record(),
                json!({ "id": id, "itemsCursor": items_cursor }),
            )
            .await?;
        data.node
            .ok_or_else(|| DomainError::RecordNotFound(id.to_string()))
    }

    async fn list_issues(&self, owner: &str, repo: &str) -> DomainResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let data: OpenIssuesData = self
                .client
                .graphql(
                    "list_open_issues",
                    queries::OPEN_ISSUES,
                    json!({ "owner": owner, "repo": repo, "cursor": cursor }),
                )
                .await?;
            let page = data
                .repository
                .ok_or_else(|| DomainError::RecordNotFound(format!("{owner}/{repo}")))?
                .issues;
            match collect_page(page, &mut ids) {
                Some(next) => cursor = Some(next),
                None => return Ok(ids),
            }
        }
    }

    async fn list_pull_requests(&self, owner: &str, repo: &str) -> DomainResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let data: OpenPullRequestsData = self
                .client
                .graphql(
                    "list_open_pull_requests",
                    queries::OPEN_PULL_REQUESTS,
                    json!({ "owner": owner, "repo": repo, "cursor": cursor }),
                )
                .await?;
            let page = data
                .repository
                .ok_or_else(|| DomainError::RecordNotFound(format!("{owner}/{repo}")))?
                .pull_requests;
            match collect_page(page, &mut ids) {
                Some(next) => cursor = Some(next),
                None => return Ok(ids),
            }
        }
    }

    async fn update_field(&self, item_id: &str, update: &FieldUpdate) -> DomainResult<()> {
        let field_id = self.layout.fields.get(update.field);
        match &update.value {
            Some(value) => {
                let _: FieldMutationData = self
                    .client
                    .graphql(
                        "update_field",
                        queries::UPDATE_FIELD,
                        json!({
                            "project": self.layout.project_id,
                            "item": item_id,
                            "field": field_id,
                            "value": field_value_input(value),
                        }),
                    )
                    .await?;
            }
            None => {
                let _: FieldMutationData = self
                    .client
                    .graphql(
                        "clear_field",
                        queries::CLEAR_FIELD,
                        json!({
                            "project": self.layout.project_id,
                            "item": item_id,
                            "field": field_id,
                        }),
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

/// Append a page of ids; returns the next cursor when there are more pages.
fn collect_page(page: PagedConnection<IdNode>, ids: &mut Vec<String>) -> Option<String> {
    ids.extend(page.nodes.into_iter().map(|n| n.id));
    if page.page_info.has_next_page {
        page.page_info.end_cursor
    } else {
        None
    }
}

/// `ProjectV2FieldValue` input object for a value.
fn field_value_input(value: &FieldValue) -> Value {
    match value {
        FieldValue::SingleSelect { option_id, .. } => json!({ "singleSelectOptionId": option_id }),
        FieldValue::Iteration { iteration_id, .. } => json!({ "iterationId": iteration_id }),
        FieldValue::Number(n) => json!({ "number": n }),
        FieldValue::Text(t) => json!({ "text": t }),
    }
}

#[async_trait]
impl RecordRepository for GitHubProjectTracker {
    async fn fetch_record(&self, id: &str) -> DomainResult<Record> {
        let mut node = self.fetch_node(id, None).await?;
        let mut cursor = node.next_items_cursor();
        while let Some(after) = cursor {
            let page = self.fetch_node(id, Some(&after)).await?;
            cursor = page.next_items_cursor();
            node.project_items.nodes.extend(page.project_items.nodes);
        }
        node.into_record()
    }

    async fn list_open_records(&self, owner: &str, repo: &str) -> DomainResult<Vec<RecordRef>> {
        let issues = self.list_issues(owner, repo).await?;
        let pulls = self.list_pull_requests(owner, repo).await?;
        tracing::debug!(issues = issues.len(), pull_requests = pulls.len(), "listed open records");

        Ok(issues
            .into_iter()
            .map(|id| RecordRef {
                id,
                kind: RecordKind::Issue,
            })
            .chain(pulls.into_iter().map(|id| RecordRef {
                id,
                kind: RecordKind::PullRequest,
            }))
            .collect())
    }
}

#[async_trait]
impl ProjectMutator for GitHubProjectTracker {
    async fn add_to_project(&self, record_id: &str) -> DomainResult<String> {
        let data: AddItemData = self
            .client
            .graphql(
                "add_item",
                queries::ADD_ITEM,
                json!({ "project": self.layout.project_id, "content": record_id }),
            )
            .await?;
        Ok(data.add_project_v2_item_by_id.item.id)
    }

    async fn remove_from_project(&self, item_id: &str) -> DomainResult<()> {
        let result: DomainResult<DeleteItemData> = self
            .client
            .graphql(
                "delete_item",
                queries::DELETE_ITEM,
                json!({ "project": self.layout.project_id, "item": item_id }),
            )
            .await;
        match result {
            Ok(data) => {
                tracing::debug!(deleted = ?data.delete_project_v2_item.deleted_item_id, "item deleted");
                Ok(())
            }
            // Already gone.
            Err(DomainError::RecordNotFound(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn set_fields(&self, item_id: &str, updates: &[FieldUpdate]) -> DomainResult<()> {
        for update in updates {
            self.update_field(item_id, update).await?;
        }
        Ok(())
    }
}
