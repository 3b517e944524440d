//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::commands::check::CheckArgs;
use crate::cli::commands::reconcile::ReconcileArgs;
use crate::cli::commands::sweep::SweepArgs;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "shepherd")]
#[command(about = "Shepherd - keeps issues and pull requests consistent with the project board", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file, instead of .shepherd/config.yaml and .shepherd/local.yaml
    #[arg(short, long, global = true, env = "SHEPHERD_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report the first violation on each record without changing anything
    Check(CheckArgs),

    /// Repair records until they satisfy every project invariant
    Reconcile(ReconcileArgs),

    /// Reconcile every open issue and pull request in a repository
    Sweep(SweepArgs),

    /// Print the resolved project layout
    Layout,
}
