//! Normalizer: `RawNode` → `NormalizedNode`
//!
//! Pure and deterministic:
//!
//! - identifier = first `notation`, else first `identifier`, else `subject_uri`
//! - `subClassOf` / `is_a` values move to `parent_identifiers`
//! - `associated_terms` become `relations` (hierarchy-named ones become parents)
//! - subsets become parallel `subset` / `subset_definition` properties
//! - IRI subjects get a `uri` property
//! - one value → `Single`, two or more → `Many`

use std::collections::BTreeSet;

use ontograph_storage::PropertyValue;

use crate::shared::vocab::{
    is_hierarchy_relation, HIERARCHY_KEYS, IDENTIFIER, NOTATION, SUBSET, SUBSET_DEFINITION, URI,
};
use crate::shared::{NormalizedNode, RawNode};

/// Labels assigned to every node of one ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLabels {
    pub primary: String,
    pub tags: BTreeSet<String>,
}

impl NodeLabels {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            tags: BTreeSet::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

pub fn normalize(raw: &RawNode, labels: &NodeLabels) -> NormalizedNode {
    let identifier = raw
        .first(NOTATION)
        .or_else(|| raw.first(IDENTIFIER))
        .unwrap_or(&raw.subject_uri);

    let mut node = NormalizedNode::new(identifier, labels.primary.as_str());
    node.tags = labels
        .tags
        .iter()
        .filter(|t| **t != labels.primary)
        .cloned()
        .collect();

    for (key, values) in &raw.properties {
        if HIERARCHY_KEYS.contains(&key.as_str()) {
            for parent in values {
                node.add_parent(parent.as_str());
            }
            continue;
        }
        if let Some(value) = PropertyValue::from_values(values.clone()) {
            node.properties.insert(key.clone(), value);
        }
    }

    for (relation, targets) in &raw.associated_terms {
        for target in targets {
            if is_hierarchy_relation(relation) {
                node.add_parent(target.as_str());
            } else {
                node.add_relation(relation.as_str(), target.as_str());
            }
        }
    }

    let codes: Vec<String> = raw.subsets.iter().map(|s| s.code.clone()).collect();
    let definitions: Vec<String> = raw.subsets.iter().map(|s| s.definition.clone()).collect();
    if let Some(value) = PropertyValue::from_values(codes) {
        node.properties.insert(SUBSET.to_string(), value);
    }
    if let Some(value) = PropertyValue::from_values(definitions) {
        node.properties.insert(SUBSET_DEFINITION.to_string(), value);
    }

    if raw.subject_uri.contains("://") && !node.properties.contains_key(URI) {
        node.properties.insert(
            URI.to_string(),
            PropertyValue::Single(raw.subject_uri.clone()),
        );
    }

    node
}

pub fn normalize_all(raws: &[RawNode], labels: &NodeLabels) -> Vec<NormalizedNode> {
    raws.iter().map(|raw| normalize(raw, labels)).collect()
}
