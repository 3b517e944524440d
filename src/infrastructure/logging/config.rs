//! Logger settings derived from the `logging` config section.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::domain::models::LoggingConfig;

/// Resolved logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Format of the stderr stream
    pub format: LogFormat,

    /// Directory for JSON log files; stderr only when `None`
    pub log_dir: Option<PathBuf>,

    /// Rotation of the log file
    pub rotation: RotationPolicy,
}

/// Output format of the stderr layer
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Human-readable, multi-line
    #[default]
    Pretty,
}

/// Rotation of the JSON log file
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    /// New file every day
    #[default]
    Daily,
    /// New file every hour
    Hourly,
    /// Single file
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}

impl LogConfig {
    /// Force JSON on stderr, e.g. when the command output itself is JSON.
    pub fn with_json(mut self, json: bool) -> Self {
        if json {
            self.format = LogFormat::Json;
        }
        self
    }
}

impl TryFrom<&LoggingConfig> for LogConfig {
    type Error = anyhow::Error;

    fn try_from(config: &LoggingConfig) -> Result<Self> {
        let format = match config.format.as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            other => bail!("Invalid log format: {other}"),
        };
        let rotation = match config.rotation.as_str() {
            "daily" => RotationPolicy::Daily,
            "hourly" => RotationPolicy::Hourly,
            "never" => RotationPolicy::Never,
            other => bail!("Invalid log rotation: {other}"),
        };
        Ok(Self {
            level: config.level.clone(),
            format,
            log_dir: config.log_dir.clone(),
            rotation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_logging_config() {
        let logging = LoggingConfig {
            level: "debug".into(),
            format: "json".into(),
            log_dir: Some(PathBuf::from("/tmp/shepherd")),
            rotation: "hourly".into(),
        };
        let config = LogConfig::try_from(&logging).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.rotation, RotationPolicy::Hourly);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/shepherd")));
    }

    #[test]
    fn test_rejects_unknown_format() {
        let logging = LoggingConfig {
            format: "xml".into(),
            ..Default::default()
        };
        assert!(LogConfig::try_from(&logging).is_err());
    }

    #[test]
    fn test_json_flag_overrides_format() {
        assert_eq!(LogConfig::default().with_json(true).format, LogFormat::Json);
        assert_eq!(LogConfig::default().with_json(false).format, LogFormat::Pretty);
    }
}
