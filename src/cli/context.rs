//! Wiring shared by the commands that talk to GitHub.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::github::{resolve_layout, GitHubClient, GitHubProjectTracker};
use crate::domain::models::{Config, ProjectLayout};
use crate::infrastructure::config::ConfigLoader;
use crate::services::{ReconcilePolicy, Reconciler};

/// Load configuration from `path`, or from the project-local `.shepherd` directory.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Configuration, resolved layout and the GitHub tracker for one run.
pub struct AppContext {
    /// Loaded configuration.
    pub config: Config,
    /// Layout resolved for this run.
    pub layout: Arc<ProjectLayout>,
    /// Tracker bound to the resolved layout.
    pub tracker: Arc<GitHubProjectTracker>,
}

impl AppContext {
    /// Build the GitHub client and resolve the project layout.
    pub async fn connect(config: Config) -> Result<Self> {
        let client = GitHubClient::from_config(&config.github, &config.retry)
            .context("Failed to create GitHub client")?;
        let layout = resolve_layout(&client, &config.project)
            .await
            .context("Failed to resolve project layout")?;
        let layout = Arc::new(layout);
        let tracker = Arc::new(GitHubProjectTracker::new(
            Arc::new(client),
            Arc::clone(&layout),
        ));

        Ok(Self {
            config,
            layout,
            tracker,
        })
    }

    /// Reconcile policy from config, with the given dry-run mode.
    pub fn policy(&self, dry_run: bool) -> ReconcilePolicy {
        ReconcilePolicy {
            max_attempts: self.config.reconcile.max_attempts,
            dry_run,
        }
    }

    /// Reconciler reading and writing through the tracker.
    pub fn reconciler(&self, dry_run: bool) -> Reconciler {
        Reconciler::new(
            self.tracker.clone(),
            self.tracker.clone(),
            Arc::clone(&self.layout),
            self.policy(dry_run),
        )
    }
}
