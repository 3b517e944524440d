//! `shepherd layout`: print the resolved project layout.

use anyhow::Result;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, ProjectLayout};

/// Resolved layout, as printed by `shepherd layout`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct LayoutOutput(pub ProjectLayout);

impl CommandOutput for LayoutOutput {
    fn to_human(&self) -> String {
        TableFormatter::new().format_layout(&self.0)
    }
}

/// Resolve and print the project layout.
pub async fn execute(config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::connect(config).await?;
    output(&LayoutOutput(ctx.layout.as_ref().clone()), json_mode);
    Ok(())
}
