//! Error types for ontograph-core
//!
//! Feature modules keep their own error enums; `OntographError` unifies
//! them for the ingestion pipeline and the CLI.

use ontograph_storage::StorageError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::features::hierarchy::HierarchyError;
use crate::features::merge::MergeError;
use crate::features::parsing::ParseError;
use crate::features::search::IndexError;

/// Main error type for ontograph-core operations
#[derive(Debug, Error)]
pub enum OntographError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("Search error: {0}")]
    Index(#[from] IndexError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ontograph operations
pub type Result<T> = std::result::Result<T, OntographError>;
