//! Read-side views

use ontograph_storage::GraphNode;
use serde::{Deserialize, Serialize};

/// `(name, code)` pair used for parent lists, listings and search hits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub name: String,
    pub code: String,
}

impl EntrySummary {
    pub fn of(node: &GraphNode) -> Self {
        Self {
            name: node.display_name().to_string(),
            code: node.key().to_string(),
        }
    }
}

/// One node of a lazily loaded hierarchy tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyTreeNode {
    /// `coalesce(notation, identifier)`
    pub key: String,
    pub label: String,
    /// Node snapshot
    pub payload: GraphNode,
    pub is_leaf: bool,
    /// Children not yet fetched
    pub loading: bool,
    /// Every SUBCLASS_OF parent; filled by `children`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<EntrySummary>,
    #[serde(default)]
    pub children: Vec<HierarchyTreeNode>,
}

impl HierarchyTreeNode {
    pub fn lazy(node: GraphNode, is_leaf: bool) -> Self {
        Self {
            key: node.key().to_string(),
            label: node.display_name().to_string(),
            payload: node,
            is_leaf,
            loading: true,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.payload.identifier
    }
}

/// Ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub name: String,
    pub code: String,
    pub score: f32,
}
