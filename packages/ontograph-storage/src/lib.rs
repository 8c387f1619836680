//! Ontograph graph store
//!
//! Transactional port over the entity graph that the ingestion engine writes
//! and the hierarchy/search engines read.
//!
//! ## Core Principles
//!
//! 1. **One key**: every node resolves to `coalesce(notation, identifier)`
//! 2. **No dangling edges**: both endpoints must exist when an edge is created
//! 3. **Scoped transactions**: a transaction dropped without `commit` rolls back
//!
//! ## Usage
//!
//! ```rust
//! use ontograph_storage::{GraphEdge, GraphNode, GraphStore, InMemoryGraphStore};
//!
//! let store = InMemoryGraphStore::new();
//! let mut tx = store.begin().unwrap();
//! tx.create_node(&GraphNode::new("DOID:4", "Term")).unwrap();
//! tx.create_node(&GraphNode::new("DOID:162", "Term")).unwrap();
//! tx.create_edge(&GraphEdge::new("DOID:162", "SUBCLASS_OF", "DOID:4")).unwrap();
//! tx.commit().unwrap();
//!
//! let tx = store.begin().unwrap();
//! assert_eq!(tx.incoming("DOID:4", None).unwrap().len(), 1);
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{ErrorKind, Result, StorageError};

pub use domain::{
    strip_scope, GraphEdge, GraphNode, GraphStore, GraphTransaction, PropertyValue, NAME_KEYS,
    NOTATION_KEY, URI_KEY,
};

pub use infrastructure::InMemoryGraphStore;

#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteGraphStore;
