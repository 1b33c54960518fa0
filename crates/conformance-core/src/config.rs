//! Workbench configuration.
//!
//! Configuration is read from a TOML file and then overridden by environment
//! variables:
//!
//! ```toml
//! workbench_id = "repository-workbench"
//! log_level = "info"
//! call_timeout_ms = 30000
//! max_parallel_cases = 1
//! placeholder_collection_id = "unknown-metadata-collection"
//! purge_instances = true
//! ```
//!
//! | variable | field |
//! |---|---|
//! | `CONFORMANCE_WORKBENCH_ID` | `workbench_id` |
//! | `CONFORMANCE_LOG_LEVEL` | `log_level` |
//! | `CONFORMANCE_CALL_TIMEOUT_MS` | `call_timeout_ms` |
//! | `CONFORMANCE_MAX_PARALLEL_CASES` | `max_parallel_cases` |

use crate::error::{ConformanceError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const ENV_WORKBENCH_ID: &str = "CONFORMANCE_WORKBENCH_ID";
pub const ENV_LOG_LEVEL: &str = "CONFORMANCE_LOG_LEVEL";
pub const ENV_CALL_TIMEOUT_MS: &str = "CONFORMANCE_CALL_TIMEOUT_MS";
pub const ENV_MAX_PARALLEL_CASES: &str = "CONFORMANCE_MAX_PARALLEL_CASES";

/// Default identifier prefixed to every test case id
pub const DEFAULT_WORKBENCH_ID: &str = "repository-workbench";

/// Collection id used to bind the throwaway handle that discovers the real one
pub const DEFAULT_PLACEHOLDER_COLLECTION_ID: &str = "unknown-metadata-collection";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Settings for one workbench run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkbenchConfig {
    pub workbench_id: String,
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
    /// Deadline applied to every call made against the metadata collection
    pub call_timeout_ms: u64,
    /// Test cases of one fan-out stage allowed in flight at once
    pub max_parallel_cases: usize,
    pub placeholder_collection_id: String,
    /// Purge instances created by lifecycle test cases
    pub purge_instances: bool,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            workbench_id: DEFAULT_WORKBENCH_ID.to_string(),
            log_level: "info".to_string(),
            call_timeout_ms: 30_000,
            max_parallel_cases: 1,
            placeholder_collection_id: DEFAULT_PLACEHOLDER_COLLECTION_ID.to_string(),
            purge_instances: true,
        }
    }
}

impl WorkbenchConfig {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist, then apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid
    pub async fn load(path: &Path) -> Result<Self> {
        let mut config = if tokio::fs::try_exists(path).await? {
            debug!("Loading workbench configuration from {}", path.display());
            let content = tokio::fs::read_to_string(path).await?;
            toml::from_str(&content).map_err(|e| {
                ConformanceError::config(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            debug!("No configuration at {}, using defaults", path.display());
            Self::default()
        };

        config.merge_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to `path` as TOML
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.export_toml()?).await?;
        Ok(())
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConformanceError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if self.workbench_id.trim().is_empty() {
            return Err(ConformanceError::config("workbench_id must not be empty"));
        }

        if self.placeholder_collection_id.trim().is_empty() {
            return Err(ConformanceError::config(
                "placeholder_collection_id must not be empty",
            ));
        }

        if self.call_timeout_ms == 0 {
            return Err(ConformanceError::config(
                "call_timeout_ms must be greater than 0",
            ));
        }

        if self.max_parallel_cases == 0 {
            return Err(ConformanceError::config(
                "max_parallel_cases must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Merge environment variable overrides into the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    pub fn merge_env_vars(&mut self) -> Result<()> {
        if let Ok(workbench_id) = std::env::var(ENV_WORKBENCH_ID) {
            debug!("Overriding workbench_id from environment: {}", workbench_id);
            self.workbench_id = workbench_id;
        }

        if let Ok(log_level) = std::env::var(ENV_LOG_LEVEL) {
            debug!("Overriding log_level from environment: {}", log_level);
            self.log_level = log_level;
        }

        if let Ok(timeout) = std::env::var(ENV_CALL_TIMEOUT_MS) {
            self.call_timeout_ms = timeout.parse().map_err(|_| {
                ConformanceError::config(format!(
                    "Invalid {} value '{}'",
                    ENV_CALL_TIMEOUT_MS, timeout
                ))
            })?;
        }

        if let Ok(parallel) = std::env::var(ENV_MAX_PARALLEL_CASES) {
            self.max_parallel_cases = parallel.parse().map_err(|_| {
                ConformanceError::config(format!(
                    "Invalid {} value '{}'",
                    ENV_MAX_PARALLEL_CASES, parallel
                ))
            })?;
        }

        Ok(())
    }

    /// Per-call deadline as a duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn export_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ConformanceError::config(format!("Failed to export config to JSON: {}", e))
        })
    }

    pub fn import_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            ConformanceError::config(format!("Failed to import config from JSON: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn export_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ConformanceError::config(format!("Failed to export config to TOML: {}", e))
        })
    }

    pub fn import_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            ConformanceError::config(format!("Failed to import config from TOML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = WorkbenchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = WorkbenchConfig::default();
        config.log_level = "loud".to_string();
        assert!(config.validate().unwrap_err().is_config());

        let mut config = WorkbenchConfig::default();
        config.call_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = WorkbenchConfig::default();
        config.max_parallel_cases = 0;
        assert!(config.validate().is_err());

        let mut config = WorkbenchConfig::default();
        config.placeholder_collection_id = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_export_import_toml() {
        let mut config = WorkbenchConfig::default();
        config.max_parallel_cases = 4;

        let toml_str = config.export_toml().unwrap();
        assert!(toml_str.contains("max_parallel_cases = 4"));

        let imported = WorkbenchConfig::import_toml(&toml_str).unwrap();
        assert_eq!(imported, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = WorkbenchConfig::import_toml("call_timeout_ms = 500").unwrap();
        assert_eq!(config.call_timeout_ms, 500);
        assert_eq!(config.workbench_id, DEFAULT_WORKBENCH_ID);
        assert!(config.purge_instances);
    }

    #[test]
    fn test_invalid_import() {
        assert!(WorkbenchConfig::import_json("invalid json").is_err());
        assert!(WorkbenchConfig::import_toml("log_level = \"shouting\"").is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkbenchConfig::load(&dir.path().join("absent.toml")).await.unwrap();
        assert_eq!(config.placeholder_collection_id, DEFAULT_PLACEHOLDER_COLLECTION_ID);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("workbench.toml");

        let mut config = WorkbenchConfig::default();
        config.purge_instances = false;
        config.save(&path).await.unwrap();

        let loaded = WorkbenchConfig::load(&path).await.unwrap();
        assert!(!loaded.purge_instances);
    }
}
