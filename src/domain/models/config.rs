//! Configuration tree, deserialized by the config loader.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::models::layout::{FieldIds, ProjectLayout, StatusOptions};

/// Main configuration structure for Shepherd
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// GitHub API access
    #[serde(default)]
    pub github: GitHubConfig,

    /// Main project and its layout
    #[serde(default)]
    pub project: ProjectConfig,

    /// Reconciliation loop and sweep settings
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Retry policy for transient API failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GitHubConfig {
    /// GraphQL endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API token; falls back to `GITHUB_TOKEN` when unset
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Repository owner swept by default
    #[serde(default)]
    pub owner: Option<String>,

    /// Repository name swept by default
    #[serde(default)]
    pub repo: Option<String>,

    /// Request budget per hour
    #[serde(default = "default_requests_per_hour")]
    pub requests_per_hour: u32,
}

fn default_api_url() -> String {
    "https://api.github.com/graphql".to_string()
}

const fn default_requests_per_hour() -> u32 {
    5_000
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            owner: None,
            repo: None,
            requests_per_hour: default_requests_per_hour(),
        }
    }
}

/// Main project configuration
///
/// The layout is resolved from the project's field definitions using
/// `owner` and `number`. Any id set under `overrides` wins over the
/// resolved one; when every override is set no lookup happens at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProjectConfig {
    /// Organisation or user login that owns the project
    #[serde(default)]
    pub owner: Option<String>,

    /// Project number as shown in the project URL
    #[serde(default)]
    pub number: Option<u64>,

    /// Status option names to resolve
    #[serde(default)]
    pub status_names: StatusNames,

    /// Name of the `Stale` option; the field's first option when unset
    #[serde(default)]
    pub stale_option_name: Option<String>,

    /// Explicit ids, overriding resolution
    #[serde(default)]
    pub overrides: LayoutOverrides,
}

/// Status column names on the project board
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StatusNames {
    /// Triage column
    #[serde(default = "default_triage")]
    pub triage: String,
    /// Backlog column
    #[serde(default = "default_backlog")]
    pub backlog: String,
    /// Todo column
    #[serde(default = "default_todo")]
    pub todo: String,
    /// In progress column
    #[serde(default = "default_in_progress")]
    pub in_progress: String,
}

fn default_triage() -> String {
    "Triage".to_string()
}

fn default_backlog() -> String {
    "Backlog".to_string()
}

fn default_todo() -> String {
    "Todo".to_string()
}

fn default_in_progress() -> String {
    "In progress".to_string()
}

impl Default for StatusNames {
    fn default() -> Self {
        Self {
            triage: default_triage(),
            backlog: default_backlog(),
            todo: default_todo(),
            in_progress: default_in_progress(),
        }
    }
}

/// Explicit layout ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LayoutOverrides {
    /// Main project node id
    pub project_id: Option<String>,
    /// Status field id
    pub status_field_id: Option<String>,
    /// Cycle field id
    pub cycle_field_id: Option<String>,
    /// Stale field id
    pub stale_field_id: Option<String>,
    /// Rollovers field id
    pub rollovers_field_id: Option<String>,
    /// Triage option id
    pub triage_option_id: Option<String>,
    /// Backlog option id
    pub backlog_option_id: Option<String>,
    /// Todo option id
    pub todo_option_id: Option<String>,
    /// In progress option id
    pub in_progress_option_id: Option<String>,
    /// Current cycle iteration id
    pub current_cycle_id: Option<String>,
    /// Stale option id
    pub stale_option_id: Option<String>,
}

impl LayoutOverrides {
    /// A complete layout, if every id is given.
    pub fn to_layout(&self) -> Option<ProjectLayout> {
        Some(ProjectLayout {
            project_id: self.project_id.clone()?,
            fields: FieldIds {
                status: self.status_field_id.clone()?,
                cycle: self.cycle_field_id.clone()?,
                stale: self.stale_field_id.clone()?,
                rollovers: self.rollovers_field_id.clone()?,
            },
            statuses: StatusOptions {
                triage: self.triage_option_id.clone()?,
                backlog: self.backlog_option_id.clone()?,
                todo: self.todo_option_id.clone()?,
                in_progress: self.in_progress_option_id.clone()?,
            },
            current_cycle_id: self.current_cycle_id.clone()?,
            stale_option_id: self.stale_option_id.clone()?,
        })
    }

    /// Overwrite ids in a resolved layout with the ones given here.
    pub fn apply(&self, mut layout: ProjectLayout) -> ProjectLayout {
        fn set(target: &mut String, value: Option<&String>) {
            if let Some(v) = value {
                target.clone_from(v);
            }
        }
        set(&mut layout.project_id, self.project_id.as_ref());
        set(&mut layout.fields.status, self.status_field_id.as_ref());
        set(&mut layout.fields.cycle, self.cycle_field_id.as_ref());
        set(&mut layout.fields.stale, self.stale_field_id.as_ref());
        set(&mut layout.fields.rollovers, self.rollovers_field_id.as_ref());
        set(&mut layout.statuses.triage, self.triage_option_id.as_ref());
        set(&mut layout.statuses.backlog, self.backlog_option_id.as_ref());
        set(&mut layout.statuses.todo, self.todo_option_id.as_ref());
        set(&mut layout.statuses.in_progress, self.in_progress_option_id.as_ref());
        set(&mut layout.current_cycle_id, self.current_cycle_id.as_ref());
        set(&mut layout.stale_option_id, self.stale_option_id.as_ref());
        layout
    }
}

/// Reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReconcileConfig {
    /// Repairs allowed per record before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Records reconciled concurrently during a sweep
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

const fn default_max_attempts() -> u32 {
    10
}

const fn default_concurrency() -> usize {
    8
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            concurrency: default_concurrency(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rotated JSON log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_overrides() -> LayoutOverrides {
        LayoutOverrides {
            project_id: Some("PVT_1".into()),
            status_field_id: Some("F_s".into()),
            cycle_field_id: Some("F_c".into()),
            stale_field_id: Some("F_st".into()),
            rollovers_field_id: Some("F_r".into()),
            triage_option_id: Some("o_tr".into()),
            backlog_option_id: Some("o_bl".into()),
            todo_option_id: Some("o_td".into()),
            in_progress_option_id: Some("o_ip".into()),
            current_cycle_id: Some("it_9".into()),
            stale_option_id: Some("o_st".into()),
        }
    }

    #[test]
    fn test_complete_overrides_build_layout() {
        let layout = full_overrides().to_layout().expect("complete overrides");
        assert_eq!(layout.project_id, "PVT_1");
        assert_eq!(layout.statuses.in_progress, "o_ip");
        assert_eq!(layout.current_cycle_id, "it_9");
    }

    #[test]
    fn test_partial_overrides_do_not_build_layout() {
        let mut overrides = full_overrides();
        overrides.current_cycle_id = None;
        assert!(overrides.to_layout().is_none());
    }

    #[test]
    fn test_apply_replaces_only_given_ids() {
        let resolved = full_overrides().to_layout().unwrap();
        let overrides = LayoutOverrides {
            current_cycle_id: Some("it_10".into()),
            ..Default::default()
        };
        let layout = overrides.apply(resolved);
        assert_eq!(layout.current_cycle_id, "it_10");
        assert_eq!(layout.project_id, "PVT_1");
    }

    #[test]
    fn test_token_is_never_serialized() {
        let config = GitHubConfig {
            token: Some("ghp_secret".into()),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("ghp_secret"));
    }
}
