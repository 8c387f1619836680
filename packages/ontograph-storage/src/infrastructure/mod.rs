//! Infrastructure layer - Storage adapters
//!
//! - `memory`: copy-on-write in-memory store
//! - `sqlite`: SQLite store (feature `sqlite`)

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::InMemoryGraphStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteGraphStore;
