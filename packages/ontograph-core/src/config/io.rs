//! Configuration I/O (YAML schema)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::component_configs::*;

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsing: Option<ParsingConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<HierarchyConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<ParallelConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    /// Extra subset code definitions, merged over the built-in table
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subsets: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file() {
        let file: ConfigFileV1 = serde_yaml::from_str("version: 1\n").unwrap();
        assert_eq!(file.version, 1);
        assert!(file.parsing.is_none());
        assert!(file.subsets.is_empty());
    }

    #[test]
    fn test_unknown_top_level_field_rejected() {
        let result: Result<ConfigFileV1, _> = serde_yaml::from_str("version: 1\nlexical: {}\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let file: ConfigFileV1 =
            serde_yaml::from_str("version: 1\nsearch:\n  max_results: 25\n").unwrap();
        let search = file.search.unwrap();
        assert_eq!(search.max_results, 25);
        assert_eq!(search.fuzzy_distance, 1);
    }
}
