//! Canonical entity

use std::collections::{BTreeMap, BTreeSet};

use ontograph_storage::{GraphNode, PropertyValue};
use serde::{Deserialize, Serialize};

use crate::shared::vocab::NOTATION;

/// Canonical entity produced by the normalizer and consumed by the merger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedNode {
    /// Globally unique key, `<source>:<local-id>` for curated sources
    pub identifier: String,
    /// Exactly one primary label
    pub primary_label: String,
    /// Secondary tags
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// SUBCLASS_OF targets (identifier, notation or uri), ordered, no repeats
    #[serde(default)]
    pub parent_identifiers: Vec<String>,
    /// Non-hierarchy associations: relation name → target references
    #[serde(default)]
    pub relations: BTreeMap<String, Vec<String>>,
}

impl NormalizedNode {
    pub fn new(identifier: impl Into<String>, primary_label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            primary_label: primary_label.into(),
            tags: BTreeSet::new(),
            properties: BTreeMap::new(),
            parent_identifiers: Vec::new(),
            relations: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties
            .insert(key.into(), PropertyValue::Single(value.into()));
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.add_parent(parent);
        self
    }

    /// Append a parent unless already present
    pub fn add_parent(&mut self, parent: impl Into<String>) {
        let parent = parent.into();
        if !self.parent_identifiers.contains(&parent) {
            self.parent_identifiers.push(parent);
        }
    }

    /// Append an association target unless already present
    pub fn add_relation(&mut self, relation: impl Into<String>, target: impl Into<String>) {
        let targets = self.relations.entry(relation.into()).or_default();
        let target = target.into();
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    /// Primary label plus secondary tags
    pub fn labels(&self) -> BTreeSet<String> {
        let mut labels = self.tags.clone();
        labels.insert(self.primary_label.clone());
        labels
    }

    /// `coalesce(notation, identifier)`
    pub fn key(&self) -> &str {
        self.properties
            .get(NOTATION)
            .and_then(PropertyValue::first)
            .unwrap_or(&self.identifier)
    }

    pub fn to_graph_node(&self) -> GraphNode {
        GraphNode {
            identifier: self.identifier.clone(),
            primary_label: self.primary_label.clone(),
            tags: self.tags.clone(),
            properties: self.properties.clone(),
        }
    }

    /// Rebuild from a stored node and its resolved parent identifiers
    pub fn from_graph_node(node: GraphNode, parents: Vec<String>) -> Self {
        Self {
            identifier: node.identifier,
            primary_label: node.primary_label,
            tags: node.tags,
            properties: node.properties,
            parent_identifiers: parents,
            relations: BTreeMap::new(),
        }
    }
}
