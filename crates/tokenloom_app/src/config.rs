// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application configuration.
//!
//! Settings are stored as RON. A missing file yields the defaults, and
//! command-line flags override whatever the file says.

use crate::preview::PreviewWidget;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokenloom_graph::{EvaluationLimits, EvaluationStrategy};

/// Current configuration format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Configuration file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "tokenloom.ron";

/// Default tracing directive when `RUST_LOG` does not cover a target
pub const DEFAULT_LOG_FILTER: &str = "tokenloom_app=info,tokenloom_graph=info";

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Settings format version
    pub version: u32,
    /// Evaluation strategy for every pass
    #[serde(default)]
    pub strategy: EvaluationStrategy,
    /// Longest dependency chain the evaluator resolves
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Directory export files are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    /// Widget the token preview is rendered for
    #[serde(default)]
    pub widget: PreviewWidget,
    /// Default tracing directive
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_max_depth() -> usize {
    EvaluationLimits::default().max_depth
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            strategy: EvaluationStrategy::default(),
            max_depth: default_max_depth(),
            export_dir: default_export_dir(),
            widget: PreviewWidget::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Load settings from a file, or the defaults if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse settings from RON text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            ron::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if config.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }
        if config.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".to_string()));
        }

        Ok(config)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, pretty)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Evaluation limits derived from these settings
    pub fn limits(&self) -> EvaluationLimits {
        EvaluationLimits {
            max_depth: self.max_depth,
        }
    }
}

/// Error loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid RON for this format
    #[error("Invalid config: {0}")]
    Parse(String),

    /// The file was written by a newer version
    #[error("Config version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version understood
        supported: u32,
    },

    /// A setting is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.version, CONFIG_FORMAT_VERSION);
        assert_eq!(config.strategy, EvaluationStrategy::Incremental);
        assert_eq!(config.limits(), EvaluationLimits::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = AppConfig::parse("(version: 1, strategy: full, widget: card)").unwrap();
        assert_eq!(config.strategy, EvaluationStrategy::Full);
        assert_eq!(config.widget, PreviewWidget::Card);
        assert_eq!(config.max_depth, 64);
        assert_eq!(config.export_dir, PathBuf::from("exports"));
    }

    #[test]
    fn test_demo_config() {
        let config = AppConfig::parse(include_str!("../../../demos/tokenloom.ron")).unwrap();
        assert_eq!(config.widget, PreviewWidget::Card);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_newer_version_rejected() {
        assert!(matches!(
            AppConfig::parse("(version: 2)"),
            Err(ConfigError::UnsupportedVersion { found: 2, supported: 1 })
        ));
        assert!(matches!(
            AppConfig::parse("(version: 1, max_depth: 0)"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("tokenloom-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);

        assert_eq!(AppConfig::load_or_default(&path).unwrap(), AppConfig::default());

        let config = AppConfig {
            strategy: EvaluationStrategy::Full,
            max_depth: 8,
            widget: PreviewWidget::Input,
            ..AppConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
