//! `shepherd check`: report violations without repairing them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::adapters::memory::InMemoryTracker;
use crate::cli::context::AppContext;
use crate::cli::output::table::CheckRow;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, ProjectLayout, Record, Violation};
use crate::domain::ports::RecordRepository;
use crate::services::{ReconcilePolicy, Reconciler, SweepFailure};

/// Arguments of `shepherd check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Node ids of the issues or pull requests to check
    #[arg(required_unless_present = "from_file")]
    pub ids: Vec<String>,

    /// Check records exported to a JSON file instead of fetching them
    #[arg(long, value_name = "PATH", conflicts_with = "ids")]
    pub from_file: Option<PathBuf>,
}

/// Offline input for `--from-file`.
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    /// Layout the records are checked against.
    pub layout: ProjectLayout,
    /// Records to check.
    #[serde(default)]
    pub records: Vec<Record>,
}

/// Check result for one record.
#[derive(Debug, Serialize)]
pub struct CheckEntry {
    /// Record node id.
    pub record_id: String,
    /// Record title.
    pub title: String,
    /// Record URL.
    pub url: String,
    /// First violation found, if any.
    pub violation: Option<Violation>,
}

/// Results of `shepherd check`.
#[derive(Debug, Serialize)]
pub struct CheckOutput {
    /// One entry per record that was fetched.
    pub records: Vec<CheckEntry>,
    /// Entries with a violation.
    pub violations: usize,
    /// Records that could not be fetched.
    pub failures: Vec<SweepFailure>,
}

impl CheckOutput {
    fn new(records: Vec<CheckEntry>, failures: Vec<SweepFailure>) -> Self {
        let violations = records.iter().filter(|r| r.violation.is_some()).count();
        Self {
            records,
            violations,
            failures,
        }
    }
}

impl CommandOutput for CheckOutput {
    fn to_human(&self) -> String {
        if self.records.is_empty() && self.failures.is_empty() {
            return "No records to check.".to_string();
        }
        let formatter = TableFormatter::new();
        let mut sections = Vec::new();
        if !self.records.is_empty() {
            let rows: Vec<CheckRow<'_>> = self
                .records
                .iter()
                .map(|r| CheckRow {
                    record_id: &r.record_id,
                    title: &r.title,
                    violation: r.violation.as_ref(),
                })
                .collect();
            sections.push(formatter.format_checks(&rows));
        }
        if !self.failures.is_empty() {
            sections.push(formatter.format_failures(&self.failures));
        }
        sections.push(format!(
            "{} of {} record(s) violate a project invariant.",
            self.violations,
            self.records.len()
        ));
        if !self.failures.is_empty() {
            sections.push(format!("{} record(s) could not be fetched.", self.failures.len()));
        }
        sections.join("\n")
    }
}

/// Check records and print the first violation of each; fails if any record could not be fetched.
pub async fn execute(args: CheckArgs, config: Config, json_mode: bool) -> Result<()> {
    let out = match args.from_file {
        Some(path) => check_snapshot(&path, &config).await?,
        None => {
            let ctx = AppContext::connect(config).await?;
            check_ids(ctx.tracker.as_ref(), &ctx.reconciler(true), &args.ids).await
        }
    };

    output(&out, json_mode);
    if !out.failures.is_empty() {
        bail!(
            "{} of {} record(s) could not be checked",
            out.failures.len(),
            out.records.len() + out.failures.len()
        );
    }
    Ok(())
}

/// Fetch and inspect each record. A record that cannot be fetched is
/// reported as a failure and the rest are still checked.
async fn check_ids(
    repository: &dyn RecordRepository,
    reconciler: &Reconciler,
    ids: &[String],
) -> CheckOutput {
    let mut entries = Vec::with_capacity(ids.len());
    let mut failures = Vec::new();
    for id in ids {
        match repository.fetch_record(id).await {
            Ok(record) => entries.push(entry(reconciler, record)),
            Err(err) => {
                tracing::error!(record_id = %id, error = %err, "failed to fetch record");
                failures.push(SweepFailure {
                    record_id: id.clone(),
                    error: err.to_string(),
                });
            }
        }
    }
    CheckOutput::new(entries, failures)
}

async fn check_snapshot(path: &Path, config: &Config) -> Result<CheckOutput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    snapshot.layout.validate()?;

    let ids: Vec<String> = snapshot.records.iter().map(|r| r.id.clone()).collect();
    let tracker = Arc::new(
        InMemoryTracker::with_records(snapshot.layout.project_id.clone(), snapshot.records).await,
    );
    let reconciler = Reconciler::new(
        tracker.clone(),
        tracker.clone(),
        Arc::new(snapshot.layout),
        ReconcilePolicy {
            max_attempts: config.reconcile.max_attempts,
            dry_run: true,
        },
    );

    Ok(check_ids(tracker.as_ref(), &reconciler, &ids).await)
}

fn entry(reconciler: &Reconciler, record: Record) -> CheckEntry {
    let violation = reconciler.inspect(&record);
    CheckEntry {
        record_id: record.id,
        title: record.title,
        url: record.url,
        violation,
    }
}
