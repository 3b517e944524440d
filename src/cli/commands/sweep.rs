//! `shepherd sweep`: reconcile every open record in a repository.

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::Config;
use crate::services::{SweepService, SweepSummary};

/// Arguments of `shepherd sweep`.
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Repository owner (defaults to github.owner)
    #[arg(long)]
    pub owner: Option<String>,

    /// Repository name (defaults to github.repo)
    #[arg(long)]
    pub repo: Option<String>,

    /// Records reconciled at once (defaults to reconcile.concurrency)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Plan the first repair for each record without applying it
    #[arg(long)]
    pub dry_run: bool,
}

impl CommandOutput for SweepSummary {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let mut sections = Vec::new();
        if !self.reports.is_empty() {
            sections.push(formatter.format_reports(&self.reports));
        }
        if !self.failures.is_empty() {
            sections.push(formatter.format_failures(&self.failures));
        }
        let mut totals = format!(
            "{} record(s): {} consistent, {} repaired, {} removed, {} failed",
            self.total(),
            self.consistent,
            self.repaired,
            self.removed,
            self.failures.len()
        );
        if self.planned > 0 {
            totals.push_str(&format!(", {} with planned repairs", self.planned));
        }
        sections.push(totals);
        sections.join("\n")
    }
}

/// Run the sweep; fails if any record failed.
pub async fn execute(args: SweepArgs, config: Config, json_mode: bool) -> Result<()> {
    let owner = args
        .owner
        .or_else(|| config.github.owner.clone())
        .context("No repository owner: pass --owner or set github.owner")?;
    let repo = args
        .repo
        .or_else(|| config.github.repo.clone())
        .context("No repository name: pass --repo or set github.repo")?;
    let concurrency = args.concurrency.unwrap_or(config.reconcile.concurrency);

    let ctx = AppContext::connect(config).await?;
    let service = SweepService::new(ctx.tracker.clone(), ctx.reconciler(args.dry_run), concurrency);
    let summary = service
        .run(&owner, &repo)
        .await
        .with_context(|| format!("Failed to list open records of {owner}/{repo}"))?;

    output(&summary, json_mode);
    if summary.has_failures() {
        bail!("{} of {} record(s) failed", summary.failures.len(), summary.total());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ReconcileOutcome, ReconcileReport};

    fn report(id: &str, outcome: ReconcileOutcome) -> ReconcileReport {
        ReconcileReport {
            record_id: id.to_string(),
            outcome,
            passes: 1,
            repairs: Vec::new(),
        }
    }

    #[test]
    fn test_planned_records_are_not_reported_consistent() {
        let mut summary = SweepSummary::default();
        summary.add("I_1".into(), Ok(report("I_1", ReconcileOutcome::Planned)));
        summary.add("I_2".into(), Ok(report("I_2", ReconcileOutcome::Consistent)));

        let human = summary.to_human();
        assert!(human.contains("2 record(s): 1 consistent"), "{human}");
        assert!(human.contains("1 with planned repairs"));
    }
}
