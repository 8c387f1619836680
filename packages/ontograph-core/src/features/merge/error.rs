//! Merge errors

use ontograph_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    /// `create_one` target identifier already stored
    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    /// One or more referenced parents (or association targets) do not exist
    #[error("Unknown parent for {identifier}: {}", missing.join(", "))]
    UnknownParent {
        identifier: String,
        missing: Vec<String>,
    },

    #[error("Node not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl MergeError {
    pub fn unknown_parent(identifier: impl Into<String>, missing: Vec<String>) -> Self {
        Self::UnknownParent {
            identifier: identifier.into(),
            missing,
        }
    }
}

pub type MergeResult<T> = Result<T, MergeError>;
