//! `shepherd reconcile`: repair individual records.

use anyhow::{bail, Result};
use clap::Args;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::output;
use crate::domain::models::Config;
use crate::services::SweepSummary;

/// Arguments of `shepherd reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Node ids of the issues or pull requests to reconcile
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Treat the records as having a linked pull request
    #[arg(long)]
    pub linked: bool,

    /// Plan the first repair without applying it
    #[arg(long)]
    pub dry_run: bool,
}

/// Reconcile each id in turn; fails if any record failed.
pub async fn execute(args: ReconcileArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::connect(config).await?;
    let reconciler = ctx.reconciler(args.dry_run);

    let mut summary = SweepSummary {
        run_id: Uuid::new_v4().to_string(),
        ..Default::default()
    };
    for id in args.ids {
        let result = if args.linked {
            reconciler.reconcile_linked_by_id(&id).await
        } else {
            reconciler.reconcile_by_id(&id).await
        };
        summary.add(id, result);
    }

    output(&summary, json_mode);
    if summary.has_failures() {
        bail!("{} of {} record(s) failed", summary.failures.len(), summary.total());
    }
    Ok(())
}
