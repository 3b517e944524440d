//! In-memory project tracker.
//!
//! Implements both ports over a map of records so the reconciliation core
//! can run without the network: offline checks of exported records, and
//! tests that need to count mutations.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ProjectField, ProjectItem, Record, RecordRef};
use crate::domain::ports::{FieldUpdate, ProjectMutator, RecordRepository};

/// A write observed by the tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// A record was added to the project.
    Add {
        /// Record node id.
        record_id: String,
    },
    /// An item was removed from the project.
    Remove {
        /// Removed item.
        item_id: String,
    },
    /// Field values were written.
    SetFields {
        /// Updated item.
        item_id: String,
        /// Writes in the order they were applied.
        updates: Vec<FieldUpdate>,
    },
}

/// Records held in memory, all belonging to a single repository.
pub struct InMemoryTracker {
    project_id: String,
    records: Arc<RwLock<BTreeMap<String, Record>>>,
    mutations: Arc<RwLock<Vec<Mutation>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    ignored_fields: Arc<RwLock<HashSet<ProjectField>>>,
    fetches: AtomicU64,
    next_item: AtomicU64,
}

impl InMemoryTracker {
    /// Empty tracker for the project `project_id`.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            records: Arc::new(RwLock::new(BTreeMap::new())),
            mutations: Arc::new(RwLock::new(Vec::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
            ignored_fields: Arc::new(RwLock::new(HashSet::new())),
            fetches: AtomicU64::new(0),
            next_item: AtomicU64::new(1),
        }
    }

    /// Build a tracker pre-loaded with records.
    pub async fn with_records(
        project_id: impl Into<String>,
        records: impl IntoIterator<Item = Record>,
    ) -> Self {
        let tracker = Self::new(project_id);
        for record in records {
            tracker.insert(record).await;
        }
        tracker
    }

    /// Insert or replace a record.
    pub async fn insert(&self, record: Record) {
        self.records.write().await.insert(record.id.clone(), record);
    }

    /// Current state of a record, without counting a fetch.
    pub async fn record(&self, id: &str) -> Option<Record> {
        self.records.read().await.get(id).cloned()
    }

    /// Writes applied so far, oldest first.
    pub async fn mutations(&self) -> Vec<Mutation> {
        self.mutations.read().await.clone()
    }

    /// Forget recorded writes.
    pub async fn clear_mutations(&self) {
        self.mutations.write().await.clear();
    }

    /// Number of `fetch_record` calls served so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Make every read of `id` fail.
    pub async fn fail_record(&self, id: impl Into<String>) {
        self.failing.write().await.insert(id.into());
    }

    /// Accept writes to `field` but drop them, so violations on it never clear.
    pub async fn ignore_field(&self, field: ProjectField) {
        self.ignored_fields.write().await.insert(field);
    }

    async fn log(&self, mutation: Mutation) {
        self.mutations.write().await.push(mutation);
    }
}

#[async_trait]
impl RecordRepository for InMemoryTracker {
    async fn fetch_record(&self, id: &str) -> DomainResult<Record> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.read().await.contains(id) {
            return Err(DomainError::ExecutionFailed(format!(
                "simulated read failure for {id}"
            )));
        }
        self.record(id)
            .await
            .ok_or_else(|| DomainError::RecordNotFound(id.to_string()))
    }

    async fn list_open_records(&self, _owner: &str, _repo: &str) -> DomainResult<Vec<RecordRef>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .map(|r| RecordRef {
                id: r.id.clone(),
                kind: r.kind,
            })
            .collect())
    }
}

#[async_trait]
impl ProjectMutator for InMemoryTracker {
    async fn add_to_project(&self, record_id: &str) -> DomainResult<String> {
        self.log(Mutation::Add {
            record_id: record_id.to_string(),
        })
        .await;

        let mut records = self.records.write().await;
        let record = records
            .get_mut(record_id)
            .ok_or_else(|| DomainError::RecordNotFound(record_id.to_string()))?;
        if let Some(existing) = record.project_item(&self.project_id) {
            return Ok(existing.id.clone());
        }
        let item_id = format!("PVTI_mem_{}", self.next_item.fetch_add(1, Ordering::SeqCst));
        record
            .project_items
            .push(ProjectItem::new(item_id.clone(), self.project_id.clone()));
        Ok(item_id)
    }

    async fn remove_from_project(&self, item_id: &str) -> DomainResult<()> {
        self.log(Mutation::Remove {
            item_id: item_id.to_string(),
        })
        .await;

        for record in self.records.write().await.values_mut() {
            record.project_items.retain(|item| item.id != item_id);
        }
        Ok(())
    }

    async fn set_fields(&self, item_id: &str, updates: &[FieldUpdate]) -> DomainResult<()> {
        self.log(Mutation::SetFields {
            item_id: item_id.to_string(),
            updates: updates.to_vec(),
        })
        .await;

        let ignored = self.ignored_fields.read().await.clone();
        let mut records = self.records.write().await;
        let item = records
            .values_mut()
            .flat_map(|r| r.project_items.iter_mut())
            .find(|item| item.id == item_id)
            .ok_or_else(|| DomainError::ExecutionFailed(format!("unknown project item {item_id}")))?;

        for update in updates.iter().filter(|u| !ignored.contains(&u.field)) {
            let name = update.field.name().to_string();
            match &update.value {
                Some(value) => {
                    item.fields.insert(name, value.clone());
                }
                None => {
                    item.fields.remove(&name);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{FieldValue, RecordKind};
    use chrono::Utc;

    fn record(id: &str) -> Record {
        Record {
            id: id.into(),
            kind: RecordKind::Issue,
            title: format!("Issue {id}"),
            url: format!("https://github.com/org/repo/issues/{id}"),
            updated_at: Utc::now(),
            author: None,
            has_linked_pull_request: false,
            project_items: vec![],
        }
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let tracker = InMemoryTracker::with_records("PVT_main", [record("1")]).await;
        let first = tracker.add_to_project("1").await.unwrap();
        let second = tracker.add_to_project("1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(tracker.record("1").await.unwrap().project_items.len(), 1);
        assert_eq!(tracker.mutations().await.len(), 2);
    }

    #[tokio::test]
    async fn test_set_and_clear_fields() {
        let tracker = InMemoryTracker::with_records("PVT_main", [record("1")]).await;
        let item_id = tracker.add_to_project("1").await.unwrap();
        tracker
            .set_fields(&item_id, &[FieldUpdate::set(ProjectField::Rollovers, FieldValue::Number(2.0))])
            .await
            .unwrap();
        let stored = tracker.record("1").await.unwrap();
        assert_eq!(stored.project_item("PVT_main").unwrap().rollovers(), 2);

        tracker
            .set_fields(&item_id, &[FieldUpdate::clear(ProjectField::Rollovers)])
            .await
            .unwrap();
        let stored = tracker.record("1").await.unwrap();
        assert!(stored.project_item("PVT_main").unwrap().field(ProjectField::Rollovers).is_none());
    }

    #[tokio::test]
    async fn test_remove_drops_item() {
        let tracker = InMemoryTracker::with_records("PVT_main", [record("1")]).await;
        let item_id = tracker.add_to_project("1").await.unwrap();
        tracker.remove_from_project(&item_id).await.unwrap();
        assert!(tracker.record("1").await.unwrap().project_items.is_empty());
    }

    #[tokio::test]
    async fn test_failing_record_read() {
        let tracker = InMemoryTracker::with_records("PVT_main", [record("1")]).await;
        tracker.fail_record("1").await;
        assert!(matches!(
            tracker.fetch_record("1").await,
            Err(DomainError::ExecutionFailed(_))
        ));
        assert!(matches!(
            tracker.fetch_record("2").await,
            Err(DomainError::RecordNotFound(_))
        ));
        assert_eq!(tracker.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_ignored_field_is_not_written() {
        let tracker = InMemoryTracker::with_records("PVT_main", [record("1")]).await;
        tracker.ignore_field(ProjectField::Rollovers).await;
        let item_id = tracker.add_to_project("1").await.unwrap();
        tracker
            .set_fields(&item_id, &[FieldUpdate::set(ProjectField::Rollovers, FieldValue::Number(5.0))])
            .await
            .unwrap();
        assert_eq!(tracker.record("1").await.unwrap().project_item("PVT_main").unwrap().rollovers(), 0);
    }
}
