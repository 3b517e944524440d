//! Layered configuration loading and validation.

use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `logging.level` is not a known level.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// `logging.format` is not json or pretty.
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    /// `logging.rotation` is not a known policy.
    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    /// `reconcile.max_attempts` is zero.
    #[error("Invalid max_attempts: {0}. Must be at least 1")]
    InvalidMaxAttempts(u32),

    /// `reconcile.concurrency` is out of range.
    #[error("Invalid concurrency: {0}. Must be between 1 and 64")]
    InvalidConcurrency(usize),

    /// `github.requests_per_hour` is zero.
    #[error("Invalid requests_per_hour: {0}. Must be at least 1")]
    InvalidRequestBudget(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    /// Initial backoff is not below the maximum.
    InvalidBackoff(u64, u64),

    /// Any other invalid value.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Project-local configuration directory.
pub const CONFIG_DIR: &str = ".shepherd";

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "SHEPHERD_";

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .shepherd/config.yaml
    /// 3. .shepherd/local.yaml (optional local overrides)
    /// 4. Environment variables (SHEPHERD_* prefix)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(CONFIG_DIR)
    }

    /// Same as [`ConfigLoader::load`], rooted at `dir` instead of `.shepherd`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Config> {
        let dir = dir.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring environment
    /// overrides.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// Project coordinates are not checked here: commands that never touch
    /// the project (offline checks) must load without them. Layout
    /// resolution reports them missing instead.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if config.reconcile.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(config.reconcile.max_attempts));
        }

        if config.reconcile.concurrency == 0 || config.reconcile.concurrency > 64 {
            return Err(ConfigError::InvalidConcurrency(config.reconcile.concurrency));
        }

        if config.github.requests_per_hour == 0 {
            return Err(ConfigError::InvalidRequestBudget(config.github.requests_per_hour));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.github.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "github.api_url cannot be empty".to_string(),
            ));
        }

        if config.project.number == Some(0) {
            return Err(ConfigError::ValidationFailed(
                "project.number must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.reconcile.max_attempts, 10);
        assert_eq!(config.reconcile.concurrency, 8);
        assert_eq!(config.github.requests_per_hour, 5_000);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
github:
  owner: acme
  repo: widgets
project:
  owner: acme
  number: 4
  status_names:
    in_progress: In Progress
reconcile:
  max_attempts: 5
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.github.repo.as_deref(), Some("widgets"));
        assert_eq!(config.project.number, Some(4));
        assert_eq!(config.project.status_names.in_progress, "In Progress");
        assert_eq!(config.project.status_names.triage, "Triage");
        assert_eq!(config.reconcile.max_attempts, 5);
        assert_eq!(config.reconcile.concurrency, 8);
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel error, got: {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_validate_invalid_rotation() {
        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidRotation(_))
        ));
    }

    #[test]
    fn test_validate_zero_max_attempts() {
        let mut config = Config::default();
        config.reconcile.max_attempts = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxAttempts(0))
        ));
    }

    #[test]
    fn test_validate_concurrency_bounds() {
        let mut config = Config::default();
        config.reconcile.concurrency = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidConcurrency(0))
        ));

        config.reconcile.concurrency = 65;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidConcurrency(65))
        ));
    }

    #[test]
    fn test_validate_invalid_backoff() {
        let mut config = Config::default();
        config.retry.initial_backoff_ms = 30_000;
        config.retry.max_backoff_ms = 10_000;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff(30_000, 10_000))
        ));
    }

    #[test]
    fn test_validate_zero_project_number() {
        let mut config = Config::default();
        config.project.number = Some(0);

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_hierarchical_merging() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "project:\n  owner: acme\n  number: 4\nlogging:\n  level: info\n  format: json\n",
        )
        .unwrap();
        fs::write(dir.path().join("local.yaml"), "logging:\n  level: debug\n").unwrap();

        temp_env::with_vars(
            [
                ("SHEPHERD_PROJECT__NUMBER", Some("7")),
                ("SHEPHERD_RECONCILE__CONCURRENCY", Some("2")),
            ],
            || {
                let config = ConfigLoader::load_from_dir(dir.path()).unwrap();
                assert_eq!(config.logging.level, "debug", "local.yaml should win");
                assert_eq!(config.logging.format, "json", "base value should persist");
                assert_eq!(config.project.owner.as_deref(), Some("acme"));
                assert_eq!(config.project.number, Some(7), "environment should win");
                assert_eq!(config.reconcile.concurrency, 2);
            },
        );
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.reconcile.max_attempts, 10);
        assert!(config.project.owner.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shepherd.yaml");
        fs::write(&path, "reconcile:\n  max_attempts: 3\n").unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.reconcile.max_attempts, 3);

        assert!(ConfigLoader::load_from_file(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_invalid_file_value_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shepherd.yaml");
        fs::write(&path, "logging:\n  format: xml\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("xml"));
    }
}
