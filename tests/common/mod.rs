//! Common test utilities for integration tests
//!
//! Shared project layout and record builders.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use shepherd::domain::models::{FieldIds, StatusOptions};
use shepherd::{
    FieldValue, InMemoryTracker, ProjectField, ProjectItem, ProjectLayout, Record, RecordKind,
    ReconcilePolicy, Reconciler,
};

pub const PROJECT: &str = "PVT_main";

pub fn layout() -> ProjectLayout {
    ProjectLayout {
        project_id: PROJECT.into(),
        fields: FieldIds {
            status: "F_status".into(),
            cycle: "F_cycle".into(),
            stale: "F_stale".into(),
            rollovers: "F_rollovers".into(),
        },
        statuses: StatusOptions {
            triage: "opt_triage".into(),
            backlog: "opt_backlog".into(),
            todo: "opt_todo".into(),
            in_progress: "opt_in_progress".into(),
        },
        current_cycle_id: "it_current".into(),
        stale_option_id: "opt_stale".into(),
    }
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

/// An issue updated just now, with no project items.
pub fn issue(id: &str) -> Record {
    Record {
        id: id.into(),
        kind: RecordKind::Issue,
        title: format!("Issue {id}"),
        url: format!("https://github.com/acme/widgets/issues/{id}"),
        updated_at: Utc::now(),
        author: Some("octocat".into()),
        has_linked_pull_request: false,
        project_items: Vec::new(),
    }
}

pub fn status(option_id: &str) -> FieldValue {
    FieldValue::SingleSelect {
        option_id: option_id.into(),
        name: String::new(),
    }
}

pub fn cycle(iteration_id: &str) -> FieldValue {
    FieldValue::Iteration {
        iteration_id: iteration_id.into(),
        title: String::new(),
    }
}

/// A main-project item for `record_id`, with the given fields set.
pub fn item(record_id: &str, fields: &[(ProjectField, FieldValue)]) -> ProjectItem {
    fields.iter().fold(
        ProjectItem::new(format!("PVTI_{record_id}"), PROJECT),
        |item, (field, value)| item.with_field(*field, value.clone()),
    )
}

/// Issue already in the project with the given fields.
pub fn tracked_issue(id: &str, fields: &[(ProjectField, FieldValue)]) -> Record {
    let mut record = issue(id);
    record.project_items.push(item(id, fields));
    record
}

pub async fn tracker_with(records: impl IntoIterator<Item = Record>) -> Arc<InMemoryTracker> {
    Arc::new(InMemoryTracker::with_records(PROJECT, records).await)
}

pub fn reconciler(tracker: &Arc<InMemoryTracker>, policy: ReconcilePolicy) -> Reconciler {
    Reconciler::new(tracker.clone(), tracker.clone(), Arc::new(layout()), policy)
}
