//! Full-text search over node labels and synonyms
//!
//! The index is derived data: rebuilt from the store after every merge and
//! never written to directly.

pub mod error;
pub mod index;
pub mod schema;

pub use error::IndexError;
pub use index::{is_account, sanitize_query, IndexStats, SearchIndex};
pub use schema::SchemaFields;
