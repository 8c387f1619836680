//! Shared models

pub mod normalized;
pub mod raw_node;
pub mod tree;

use serde::{Deserialize, Serialize};

pub use normalized::NormalizedNode;
pub use raw_node::{RawNode, SynonymScope};
pub use tree::{EntrySummary, HierarchyTreeNode, SearchHit};

/// Pre-validated caller identity passed to mutating operations.
///
/// Opaque to the engine: it is recorded in logs and never checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    actor: String,
}

impl AuthContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
        }
    }

    /// Context for unattended jobs (CLI, batch loads)
    pub fn system() -> Self {
        Self::new("system")
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }
}
