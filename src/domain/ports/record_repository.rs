//! Read port for records.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Record, RecordRef};

/// Read port for records under audit
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Fetch the current state of a record by id.
    ///
    /// Must reflect every mutation that completed before the call.
    async fn fetch_record(&self, id: &str) -> DomainResult<Record>;

    /// List the open issues and pull requests of a repository.
    async fn list_open_records(&self, owner: &str, repo: &str) -> DomainResult<Vec<RecordRef>>;
}
