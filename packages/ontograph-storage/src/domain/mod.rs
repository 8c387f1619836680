//! Domain layer for the ontology graph store
//!
//! # Domain Models
//!
//! - `GraphNode`: stored entity (identifier, one primary label, secondary tags, property bag)
//! - `GraphEdge`: directed `(from, relation, to)` triple between stored identifiers
//! - `PropertyValue`: a single string or an ordered sequence of strings
//!
//! # Port Traits
//!
//! - `GraphStore`: opens scoped transactions
//! - `GraphTransaction`: typed reads and writes inside one transaction
//!
//! # Lookup Key
//!
//! Every node resolves to one lookup key: `coalesce(notation, identifier)`.
//! Adapters implement `find_by_key` and `nodes_with_key_prefix` against that
//! key, never against the raw identifier alone.
//!
//! # Examples
//!
//! ```rust,ignore
//! use ontograph_storage::{GraphEdge, GraphNode, GraphStore};
//!
//! fn example(store: &dyn GraphStore) -> ontograph_storage::Result<()> {
//!     let mut tx = store.begin()?;
//!     tx.create_node(&GraphNode::new("DOID:4", "Term"))?;
//!     tx.create_node(&GraphNode::new("DOID:162", "Term"))?;
//!     tx.create_edge(&GraphEdge::new("DOID:162", "SUBCLASS_OF", "DOID:4"))?;
//!     tx.commit()
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Property holding the source display code.
pub const NOTATION_KEY: &str = "notation";

/// Property holding the subject IRI of triple-sourced nodes.
pub const URI_KEY: &str = "uri";

/// Properties consulted, in order, for a node's display name.
pub const NAME_KEYS: [&str; 3] = ["prefLabel", "name", "label"];

/// Properties matched by label lookups (display names plus synonyms).
pub const LABEL_LOOKUP_KEYS: [&str; 5] = ["prefLabel", "name", "label", "altLabel", "synonym"];

// ═══════════════════════════════════════════════════════════════════════════
// Domain Models
// ═══════════════════════════════════════════════════════════════════════════

/// Stored property value
///
/// A property with exactly one value is kept unwrapped; two or more values
/// stay an ordered sequence. Serialized untagged, so `"x"` vs `["x", "y"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Single(String),
    Many(Vec<String>),
}

impl PropertyValue {
    /// Collapse a value list. Returns `None` for an empty list.
    pub fn from_values(mut values: Vec<String>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(PropertyValue::Single),
            _ => Some(PropertyValue::Many(values)),
        }
    }

    pub fn first(&self) -> Option<&str> {
        match self {
            PropertyValue::Single(v) => Some(v.as_str()),
            PropertyValue::Many(vs) => vs.first().map(String::as_str),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            PropertyValue::Single(v) => vec![v.as_str()],
            PropertyValue::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    pub fn into_values(self) -> Vec<String> {
        match self {
            PropertyValue::Single(v) => vec![v],
            PropertyValue::Many(vs) => vs,
        }
    }

    /// Drop repeated values, keeping first occurrences in order, then
    /// re-apply the collapsing rule.
    pub fn deduplicated(self) -> Self {
        let mut seen = BTreeSet::new();
        let values: Vec<String> = self
            .into_values()
            .into_iter()
            .filter(|v| seen.insert(v.clone()))
            .collect();
        PropertyValue::from_values(values).unwrap_or(PropertyValue::Many(Vec::new()))
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.values().iter().any(|v| *v == needle)
    }
}

/// Stored graph node
///
/// # Examples
///
/// ```rust
/// use ontograph_storage::{GraphNode, PropertyValue};
///
/// let mut node = GraphNode::new("http://example.org/A", "Entity");
/// assert_eq!(node.key(), "http://example.org/A");
///
/// node.set_property("notation", PropertyValue::Single("TEST:100".into()));
/// assert_eq!(node.key(), "TEST:100");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Globally unique identifier
    pub identifier: String,
    /// The single primary label (entity type)
    pub primary_label: String,
    /// Secondary tags (e.g. the searchable marker)
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Free-form property bag
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl GraphNode {
    pub fn new(identifier: impl Into<String>, primary_label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            primary_label: primary_label.into(),
            tags: BTreeSet::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.properties.insert(key.into(), value);
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn notation(&self) -> Option<&str> {
        self.properties.get(NOTATION_KEY).and_then(PropertyValue::first)
    }

    pub fn uri(&self) -> Option<&str> {
        self.properties.get(URI_KEY).and_then(PropertyValue::first)
    }

    /// `coalesce(notation, identifier)`
    pub fn key(&self) -> &str {
        self.notation().unwrap_or(&self.identifier)
    }

    /// First of `prefLabel`, `name`, `label`; the key when none is set.
    pub fn display_name(&self) -> &str {
        NAME_KEYS
            .iter()
            .find_map(|k| self.properties.get(*k).and_then(PropertyValue::first))
            .unwrap_or_else(|| self.key())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Primary label plus every secondary tag.
    pub fn labels(&self) -> BTreeSet<String> {
        let mut labels = self.tags.clone();
        labels.insert(self.primary_label.clone());
        labels
    }

    /// Case-insensitive match against display names and synonyms. Synonym
    /// values carry a trailing ` [SCOPE]` which is ignored.
    pub fn matches_label(&self, label: &str) -> bool {
        let wanted = label.trim().to_lowercase();
        LABEL_LOOKUP_KEYS.iter().any(|k| {
            self.properties.get(*k).is_some_and(|v| {
                v.values()
                    .iter()
                    .any(|value| strip_scope(value).to_lowercase() == wanted)
            })
        })
    }
}

/// Remove a trailing ` [SCOPE]` annotation from a synonym value.
pub fn strip_scope(value: &str) -> &str {
    match value.rfind(" [") {
        Some(idx) if value.ends_with(']') => value[..idx].trim_end(),
        _ => value,
    }
}

/// Directed relationship between two stored identifiers
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub relation: String,
    pub to: String,
}

impl GraphEdge {
    pub fn new(from: impl Into<String>, relation: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            relation: relation.into(),
            to: to.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Port Traits
// ═══════════════════════════════════════════════════════════════════════════

/// Graph store abstraction
///
/// # Implementations
///
/// - `InMemoryGraphStore`: copy-on-write snapshot store (tests, embedding)
/// - `SqliteGraphStore`: file or in-memory SQLite database
pub trait GraphStore: Send + Sync {
    /// Open a scoped transaction.
    ///
    /// A transaction dropped without `commit` is rolled back.
    fn begin(&self) -> Result<Box<dyn GraphTransaction + '_>>;
}

/// Typed operations inside one transaction
pub trait GraphTransaction {
    // ═══════════════════════════════════════════════════════════════════════
    // Node Reads
    // ═══════════════════════════════════════════════════════════════════════

    /// Get a node by exact identifier
    fn get_node(&self, identifier: &str) -> Result<Option<GraphNode>>;

    /// Find a node whose identifier or notation equals `key`
    fn find_by_key(&self, key: &str) -> Result<Option<GraphNode>>;

    /// Find a node whose identifier, notation or uri equals `reference`
    fn resolve_reference(&self, reference: &str) -> Result<Option<GraphNode>>;

    /// Nodes whose display name or synonym equals `label` (case-insensitive)
    fn find_by_label(&self, label: &str) -> Result<Vec<GraphNode>>;

    /// All nodes, ordered by identifier
    fn nodes(&self) -> Result<Vec<GraphNode>>;

    /// Nodes whose lookup key starts with `prefix`, ordered by identifier
    fn nodes_with_key_prefix(&self, prefix: &str) -> Result<Vec<GraphNode>>;

    // ═══════════════════════════════════════════════════════════════════════
    // Node Writes
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert a new node
    ///
    /// # Errors
    ///
    /// `ErrorKind::Conflict` if the identifier is already stored
    fn create_node(&mut self, node: &GraphNode) -> Result<()>;

    /// Insert or replace a node by identifier
    fn put_node(&mut self, node: &GraphNode) -> Result<()>;

    // ═══════════════════════════════════════════════════════════════════════
    // Edges
    // ═══════════════════════════════════════════════════════════════════════

    /// Create an edge. Returns `false` if the identical edge already existed.
    ///
    /// # Errors
    ///
    /// `ErrorKind::DanglingEdge` if either endpoint is missing
    fn create_edge(&mut self, edge: &GraphEdge) -> Result<bool>;

    /// Delete every outgoing edge of `from` named `relation`; returns the count
    fn delete_outgoing(&mut self, from: &str, relation: &str) -> Result<usize>;

    /// Outgoing edges of `identifier`, optionally restricted to one relation
    fn outgoing(&self, identifier: &str, relation: Option<&str>) -> Result<Vec<GraphEdge>>;

    /// Incoming edges of `identifier`, optionally restricted to one relation
    fn incoming(&self, identifier: &str, relation: Option<&str>) -> Result<Vec<GraphEdge>>;

    // ═══════════════════════════════════════════════════════════════════════
    // Completion
    // ═══════════════════════════════════════════════════════════════════════

    fn commit(self: Box<Self>) -> Result<()>;

    fn rollback(self: Box<Self>) -> Result<()>;
}
