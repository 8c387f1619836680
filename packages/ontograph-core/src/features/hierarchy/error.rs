//! Hierarchy query errors

use ontograph_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HierarchyError {
    /// No node with this identifier or notation
    #[error("Node not found: {0}")]
    NotFound(String),

    /// SUBCLASS_OF edges form a cycle through this node
    #[error("Cycle detected at {0}")]
    CycleDetected(String),

    #[error("Ancestor walk exceeded depth limit {limit}")]
    DepthExceeded { limit: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type HierarchyResult<T> = Result<T, HierarchyError>;
