//! Search index errors

use ontograph_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Index error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}
