//! Configuration
//!
//! ```text
//! defaults  →  YAML file (version: 1)  →  environment overrides  →  validate()
//! ```
//!
//! # Environment
//!
//! - `ONTOGRAPH_SOURCE_TAG`: overrides `parsing.source_tag`
//! - `ONTOGRAPH_SQLITE_PATH`: overrides `storage.sqlite_path`

pub mod component_configs;
pub mod error;
pub mod io;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use component_configs::{
    HierarchyConfig, ParallelConfig, ParsingConfig, SearchConfig, StorageConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use io::ConfigFileV1;

pub const ENV_SOURCE_TAG: &str = "ONTOGRAPH_SOURCE_TAG";
pub const ENV_SQLITE_PATH: &str = "ONTOGRAPH_SQLITE_PATH";

const SUPPORTED_VERSIONS: [u32; 1] = [1];

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OntographConfig {
    pub parsing: ParsingConfig,
    pub hierarchy: HierarchyConfig,
    pub search: SearchConfig,
    pub parallel: ParallelConfig,
    pub storage: StorageConfig,
    /// Extra subset code definitions
    pub subsets: BTreeMap<String, String>,
}

impl OntographConfig {
    /// Load from a YAML file (v1 schema), apply env overrides, validate
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "loading configuration");
        let mut config = Self::from_yaml_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document without touching the environment
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;

        if !SUPPORTED_VERSIONS.contains(&file.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: file.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let config = Self {
            parsing: file.parsing.unwrap_or_default(),
            hierarchy: file.hierarchy.unwrap_or_default(),
            search: file.search.unwrap_or_default(),
            parallel: file.parallel.unwrap_or_default(),
            storage: file.storage.unwrap_or_default(),
            subsets: file.subsets,
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize as a v1 YAML document
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: 1,
            parsing: Some(self.parsing.clone()),
            hierarchy: Some(self.hierarchy.clone()),
            search: Some(self.search.clone()),
            parallel: Some(self.parallel.clone()),
            storage: Some(self.storage.clone()),
            subsets: self.subsets.clone(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    /// Apply `ONTOGRAPH_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(tag) = lookup(ENV_SOURCE_TAG).filter(|v| !v.is_empty()) {
            self.parsing.source_tag = tag;
        }
        if let Some(path) = lookup(ENV_SQLITE_PATH).filter(|v| !v.is_empty()) {
            self.storage.sqlite_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.parsing.validate()?;
        self.hierarchy.validate()?;
        self.search.validate()?;
        self.parallel.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        OntographConfig::default().validate().unwrap();
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut config = OntographConfig::default();
        config.parsing.source_tag = "ICD10CM".to_string();
        config
            .subsets
            .insert("custom_slim".to_string(), "A custom subset.".to_string());

        let yaml = config.to_yaml().unwrap();
        let loaded = OntographConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_version_check() {
        let err = OntographConfig::from_yaml_str("version: 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion { found: 2, .. }));
    }

    #[test]
    fn test_invalid_section_rejected() {
        let err =
            OntographConfig::from_yaml_str("version: 1\nsearch:\n  max_results: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Range { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = OntographConfig::default();
        config.apply_overrides_from(|key| match key {
            ENV_SOURCE_TAG => Some("MPO".to_string()),
            ENV_SQLITE_PATH => Some("/tmp/graph.db".to_string()),
            _ => None,
        });
        assert_eq!(config.parsing.source_tag, "MPO");
        assert_eq!(config.storage.sqlite_path, Some(PathBuf::from("/tmp/graph.db")));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "version: 1\nhierarchy:\n  max_ancestor_depth: 12").unwrap();

        let config = OntographConfig::from_yaml(file.path()).unwrap();
        assert_eq!(config.hierarchy.max_ancestor_depth, 12);
        assert_eq!(config.hierarchy.max_subtree_depth, 3);
    }
}
