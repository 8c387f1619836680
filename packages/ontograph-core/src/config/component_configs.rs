//! Per-component configuration sections

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::{ConfigError, ConfigResult};

// ============================================================================
// Parsing Configuration
// ============================================================================

/// Parsing Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Prefix applied to `notation` values of triple sources (e.g. "ICD10CM")
    pub source_tag: String,

    /// Primary label for triple-sourced nodes
    pub triple_label: String,

    /// Primary label for flat-text and structured nodes
    pub term_label: String,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            source_tag: "DOID".to_string(),
            triple_label: "Entity".to_string(),
            term_label: "Term".to_string(),
        }
    }
}

impl ParsingConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.source_tag.is_empty() || self.source_tag.contains(':') {
            return Err(ConfigError::invalid(
                "source_tag",
                "must be non-empty and must not contain ':'",
            ));
        }
        for (field, label) in [("triple_label", &self.triple_label), ("term_label", &self.term_label)] {
            if label.trim().is_empty() {
                return Err(ConfigError::invalid(field, "label must not be empty"));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Hierarchy Configuration
// ============================================================================

/// Hierarchy Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Maximum SUBCLASS_OF hops followed by `ancestors` (1..=10000)
    pub max_ancestor_depth: usize,

    /// Maximum depth accepted by `subtree` (1..=32)
    pub max_subtree_depth: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_ancestor_depth: 256,
            max_subtree_depth: 3,
        }
    }
}

impl HierarchyConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_ancestor_depth < 1 || self.max_ancestor_depth > 10_000 {
            return Err(ConfigError::range_with_hint(
                "max_ancestor_depth",
                self.max_ancestor_depth,
                1,
                10_000,
                "Bounds ancestor traversal latency",
            ));
        }
        if self.max_subtree_depth < 1 || self.max_subtree_depth > 32 {
            return Err(ConfigError::range_with_hint(
                "max_subtree_depth",
                self.max_subtree_depth,
                1,
                32,
                "Deeper trees should be loaded level by level",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Search Configuration
// ============================================================================

/// Search Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum search results (1..=1000)
    pub max_results: usize,

    /// Enable fuzzy matching on names and synonyms
    pub enable_fuzzy: bool,

    /// Fuzzy edit distance (1..=2)
    pub fuzzy_distance: u8,

    /// Writer heap in bytes used during rebuilds
    pub writer_heap_bytes: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            enable_fuzzy: false,
            fuzzy_distance: 1,
            writer_heap_bytes: 50_000_000, // 50MB heap
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_results < 1 || self.max_results > 1000 {
            return Err(ConfigError::range_with_hint(
                "max_results",
                self.max_results,
                1,
                1000,
                "Max results must be reasonable",
            ));
        }
        if self.fuzzy_distance < 1 || self.fuzzy_distance > 2 {
            return Err(ConfigError::range_with_hint(
                "fuzzy_distance",
                self.fuzzy_distance,
                1,
                2,
                "Levenshtein automata are only built up to distance 2",
            ));
        }
        if self.writer_heap_bytes < 15_000_000 {
            return Err(ConfigError::range_with_hint(
                "writer_heap_bytes",
                self.writer_heap_bytes,
                15_000_000,
                usize::MAX,
                "The index writer needs at least 15MB",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Parallel Configuration
// ============================================================================

/// Parallel Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Worker threads for row normalization (0 = rayon default)
    pub num_workers: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self { num_workers: 0 }
    }
}

impl ParallelConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.num_workers > 256 {
            return Err(ConfigError::range_with_hint(
                "num_workers",
                self.num_workers,
                0,
                256,
                "Use 0 for automatic (CPU count)",
            ));
        }
        Ok(())
    }

    /// Effective worker count
    pub fn effective_workers(&self) -> usize {
        if self.num_workers == 0 {
            num_cpus::get()
        } else {
            self.num_workers
        }
    }
}

// ============================================================================
// Storage Configuration
// ============================================================================

/// Storage Configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file; in-memory store when absent
    pub sqlite_path: Option<PathBuf>,
}
