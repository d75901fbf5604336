//! Configuration for the workflow store

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StoreError};

/// What `load_workflow` does with edges whose endpoints are not in the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrphanEdgePolicy {
    /// Fail the load and leave the current graph untouched
    #[default]
    Reject,
    /// Drop the offending edges and load the rest
    Drop,
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of retained history entries
    pub history_limit: usize,

    /// Offset applied on both axes to pasted/duplicated nodes
    pub paste_offset: f64,

    /// Orphan edge handling on load
    pub orphan_edges: OrphanEdgePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            paste_offset: 50.0,
            orphan_edges: OrphanEdgePolicy::Reject,
        }
    }
}

impl StoreConfig {
    /// Create a new builder for store configuration
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.history_limit == 0 {
            return Err(StoreError::InvalidConfig(
                "history_limit must be greater than 0".to_string(),
            ));
        }

        if !self.paste_offset.is_finite() {
            return Err(StoreError::InvalidConfig(
                "paste_offset must be a finite number".to_string(),
            ));
        }

        Ok(())
    }

    /// Load and validate a YAML config file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: StoreConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), "loaded store config");
        Ok(config)
    }

    /// Load an explicit config file, or fall back to `load_default`.
    /// Either way the result has been validated once.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_yaml_file(path),
            None => Self::load_default(),
        }
    }

    /// Load the per-user config if it exists, defaults otherwise
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::from_yaml_file(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// `<config dir>/flowboard/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("flowboard").join("config.yaml"))
}

/// Builder for store configuration
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    history_limit: Option<usize>,
    paste_offset: Option<f64>,
    orphan_edges: Option<OrphanEdgePolicy>,
}

impl StoreConfigBuilder {
    /// Set the maximum number of history entries
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Set the paste/duplicate offset
    pub fn paste_offset(mut self, offset: f64) -> Self {
        self.paste_offset = Some(offset);
        self
    }

    /// Set the orphan edge policy used by `load_workflow`
    pub fn orphan_edges(mut self, policy: OrphanEdgePolicy) -> Self {
        self.orphan_edges = Some(policy);
        self
    }

    /// Build the configuration
    pub fn build(self) -> StoreConfig {
        let defaults = StoreConfig::default();

        StoreConfig {
            history_limit: self.history_limit.unwrap_or(defaults.history_limit),
            paste_offset: self.paste_offset.unwrap_or(defaults.paste_offset),
            orphan_edges: self.orphan_edges.unwrap_or(defaults.orphan_edges),
        }
    }

    /// Build and validate the configuration
    pub fn build_validated(self) -> Result<StoreConfig> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.paste_offset, 50.0);
        assert_eq!(config.orphan_edges, OrphanEdgePolicy::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::builder()
            .history_limit(10)
            .orphan_edges(OrphanEdgePolicy::Drop)
            .build();

        assert_eq!(config.history_limit, 10);
        assert_eq!(config.paste_offset, 50.0);
        assert_eq!(config.orphan_edges, OrphanEdgePolicy::Drop);
    }

    #[test]
    fn test_validation() {
        let result = StoreConfig::builder().history_limit(0).build_validated();
        assert!(matches!(result, Err(StoreError::InvalidConfig(_))));

        let result = StoreConfig::builder().paste_offset(f64::NAN).build_validated();
        assert!(result.is_err());
    }

    #[test]
    fn test_load_explicit_file_is_validated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "history_limit: 0").unwrap();

        let result = StoreConfig::load(Some(file.path()));
        assert!(matches!(result, Err(StoreError::InvalidConfig(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "paste_offset: 20.0").unwrap();
        let config = StoreConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.paste_offset, 20.0);
    }

    #[test]
    fn test_yaml_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "history_limit: 5\norphan_edges: drop").unwrap();

        let config = StoreConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.paste_offset, 50.0);
        assert_eq!(config.orphan_edges, OrphanEdgePolicy::Drop);
    }
}
