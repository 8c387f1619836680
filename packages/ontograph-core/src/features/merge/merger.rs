//! Graph merger
//!
//! ```text
//! upsert(batch):
//!   pass 1  merge-by-identifier   (overwrite per key, extend tags)
//!   pass 2  SUBCLASS_OF + association edges, dangling targets dropped
//!   commit → index rebuild
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use ontograph_storage::{GraphEdge, GraphNode, GraphStore, GraphTransaction, PropertyValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{MergeError, MergeResult};
use crate::features::search::{IndexError, SearchIndex};
use crate::shared::vocab::{is_hierarchy_relation, SUBCLASS_OF};
use crate::shared::{AuthContext, NormalizedNode};

/// Result of a committed mutation
///
/// `index_error` is set when the mutation committed but the follow-up
/// index rebuild failed; search results are stale until the next rebuild.
#[derive(Debug)]
pub struct MergeOutcome<T> {
    pub value: T,
    pub index_error: Option<IndexError>,
}

impl<T> MergeOutcome<T> {
    pub fn is_degraded(&self) -> bool {
        self.index_error.is_some()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Counters for one batch upsert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    pub nodes_created: usize,
    pub nodes_updated: usize,
    pub edges_created: usize,
    /// Edges whose target could not be resolved
    pub edges_dropped: usize,
}

pub struct GraphMerger {
    store: Arc<dyn GraphStore>,
    index: Arc<SearchIndex>,
}

/// Relation names meaning "parent" are stored as `SUBCLASS_OF`
fn edge_relation(relation: &str) -> &str {
    if is_hierarchy_relation(relation) {
        SUBCLASS_OF
    } else {
        relation
    }
}

fn deduplicated(properties: BTreeMap<String, PropertyValue>) -> BTreeMap<String, PropertyValue> {
    properties
        .into_iter()
        .map(|(key, value)| (key, value.deduplicated()))
        .collect()
}

fn check_node(node: &NormalizedNode) -> MergeResult<()> {
    if node.identifier.trim().is_empty() {
        return Err(MergeError::InvalidInput("empty identifier".to_string()));
    }
    if node.primary_label.trim().is_empty() {
        return Err(MergeError::InvalidInput(format!(
            "empty primary label for {}",
            node.identifier
        )));
    }
    Ok(())
}

/// Resolve every reference; `Err` carries all references that did not resolve
fn resolve_all(
    tx: &dyn GraphTransaction,
    references: &[String],
) -> MergeResult<Result<Vec<String>, Vec<String>>> {
    let mut resolved = Vec::with_capacity(references.len());
    let mut missing = Vec::new();
    for reference in references {
        match tx.resolve_reference(reference)? {
            Some(target) => {
                if !resolved.contains(&target.identifier) {
                    resolved.push(target.identifier);
                }
            }
            None => missing.push(reference.clone()),
        }
    }
    Ok(if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(missing)
    })
}

impl GraphMerger {
    pub fn new(store: Arc<dyn GraphStore>, index: Arc<SearchIndex>) -> Self {
        Self { store, index }
    }

    /// Rebuild the index after a committed mutation
    fn finish<T>(&self, value: T) -> MergeOutcome<T> {
        let index_error = match self.index.rebuild() {
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "index rebuild failed after commit");
                Some(e)
            }
        };
        MergeOutcome { value, index_error }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Batch
    // ═══════════════════════════════════════════════════════════════════════

    pub fn upsert(
        &self,
        nodes: &[NormalizedNode],
        auth: &AuthContext,
    ) -> MergeResult<MergeOutcome<MergeSummary>> {
        for node in nodes {
            check_node(node)?;
        }

        let mut summary = MergeSummary::default();
        let mut tx = self.store.begin()?;

        for node in nodes {
            match tx.get_node(&node.identifier)? {
                Some(mut existing) => {
                    for (key, value) in &node.properties {
                        existing
                            .properties
                            .insert(key.clone(), value.clone().deduplicated());
                    }
                    existing.tags.extend(node.tags.iter().cloned());
                    if existing.primary_label != node.primary_label {
                        existing.tags.insert(node.primary_label.clone());
                    }
                    tx.put_node(&existing)?;
                    summary.nodes_updated += 1;
                }
                None => {
                    let mut created = node.to_graph_node();
                    created.properties = deduplicated(created.properties);
                    tx.create_node(&created)?;
                    summary.nodes_created += 1;
                }
            }
        }

        for node in nodes {
            let targets = node
                .parent_identifiers
                .iter()
                .map(|p| (SUBCLASS_OF, p))
                .chain(node.relations.iter().flat_map(|(relation, targets)| {
                    targets.iter().map(move |t| (edge_relation(relation), t))
                }));

            for (relation, reference) in targets {
                match tx.resolve_reference(reference)? {
                    Some(target) => {
                        let edge = GraphEdge::new(&node.identifier, relation, target.identifier);
                        if tx.create_edge(&edge)? {
                            summary.edges_created += 1;
                        }
                    }
                    None => {
                        debug!(
                            from = %node.identifier,
                            relation,
                            target = %reference,
                            "dropping edge to unknown target"
                        );
                        summary.edges_dropped += 1;
                    }
                }
            }
        }

        tx.commit()?;
        info!(
            actor = auth.actor(),
            created = summary.nodes_created,
            updated = summary.nodes_updated,
            edges = summary.edges_created,
            dropped = summary.edges_dropped,
            "batch upsert committed"
        );
        Ok(self.finish(summary))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Single Node
    // ═══════════════════════════════════════════════════════════════════════

    /// Strict create. Nothing is written unless the identifier is unused and
    /// every parent and association target exists.
    pub fn create_one(
        &self,
        mut node: NormalizedNode,
        parents: &[String],
        label: &str,
        auth: &AuthContext,
    ) -> MergeResult<MergeOutcome<NormalizedNode>> {
        node.primary_label = label.to_string();
        node.tags.remove(label);
        check_node(&node)?;

        let mut tx = self.store.begin()?;
        if tx.get_node(&node.identifier)?.is_some() || tx.find_by_key(&node.identifier)?.is_some()
        {
            return Err(MergeError::DuplicateIdentifier(node.identifier));
        }

        let mut references: Vec<String> = parents.to_vec();
        for parent in &node.parent_identifiers {
            if !references.contains(parent) {
                references.push(parent.clone());
            }
        }
        let parent_ids = match resolve_all(tx.as_ref(), &references)? {
            Ok(ids) => ids,
            Err(missing) => return Err(MergeError::unknown_parent(node.identifier, missing)),
        };

        let mut associations = Vec::new();
        let mut missing = Vec::new();
        for (relation, targets) in &node.relations {
            match resolve_all(tx.as_ref(), targets)? {
                Ok(ids) => associations.extend(ids.into_iter().map(|id| (edge_relation(relation), id))),
                Err(unresolved) => missing.extend(unresolved),
            }
        }
        if !missing.is_empty() {
            return Err(MergeError::unknown_parent(node.identifier, missing));
        }

        let mut stored = node.to_graph_node();
        stored.properties = deduplicated(stored.properties);
        tx.create_node(&stored).map_err(|e| {
            if e.is_conflict() {
                MergeError::DuplicateIdentifier(node.identifier.clone())
            } else {
                MergeError::Storage(e)
            }
        })?;

        for parent in &parent_ids {
            tx.create_edge(&GraphEdge::new(&node.identifier, SUBCLASS_OF, parent))?;
        }
        for (relation, target) in &associations {
            tx.create_edge(&GraphEdge::new(&node.identifier, *relation, target))?;
        }
        tx.commit()?;

        info!(
            actor = auth.actor(),
            identifier = %node.identifier,
            parents = parent_ids.len(),
            "node created"
        );
        let created = NormalizedNode::from_graph_node(stored, parent_ids);
        Ok(self.finish(created))
    }

    /// Replace a node's properties and parents; swap its primary label when
    /// `new_label` differs. Secondary tags are left as they are.
    pub fn update_one(
        &self,
        identifier: &str,
        new_properties: BTreeMap<String, PropertyValue>,
        new_parents: &[String],
        new_label: Option<&str>,
        auth: &AuthContext,
    ) -> MergeResult<MergeOutcome<NormalizedNode>> {
        if let Some(label) = new_label {
            if label.trim().is_empty() {
                return Err(MergeError::InvalidInput("empty primary label".to_string()));
            }
        }

        let mut tx = self.store.begin()?;
        let mut node: GraphNode = tx
            .find_by_key(identifier)?
            .ok_or_else(|| MergeError::NotFound(identifier.to_string()))?;

        let parent_ids = match resolve_all(tx.as_ref(), new_parents)? {
            Ok(ids) => ids,
            Err(missing) => return Err(MergeError::unknown_parent(identifier, missing)),
        };

        if let Some(label) = new_label {
            if node.primary_label != label {
                debug!(identifier, from = %node.primary_label, to = label, "swapping primary label");
                node.primary_label = label.to_string();
            }
        }
        node.properties = deduplicated(new_properties);
        tx.put_node(&node)?;

        let removed = tx.delete_outgoing(&node.identifier, SUBCLASS_OF)?;
        for parent in &parent_ids {
            tx.create_edge(&GraphEdge::new(&node.identifier, SUBCLASS_OF, parent))?;
        }
        tx.commit()?;

        info!(
            actor = auth.actor(),
            identifier = %node.identifier,
            removed_parents = removed,
            parents = parent_ids.len(),
            "node updated"
        );
        let updated = NormalizedNode::from_graph_node(node, parent_ids);
        Ok(self.finish(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use ontograph_storage::{InMemoryGraphStore, StorageError};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn merger() -> (Arc<InMemoryGraphStore>, GraphMerger) {
        let store = Arc::new(InMemoryGraphStore::new());
        let index = Arc::new(SearchIndex::new(store.clone(), SearchConfig::default()));
        (store.clone(), GraphMerger::new(store, index))
    }

    fn term(id: &str, name: &str) -> NormalizedNode {
        NormalizedNode::new(id, "Term").with_property("name", name)
    }

    fn parents_of(store: &InMemoryGraphStore, id: &str) -> Vec<String> {
        let tx = store.begin().unwrap();
        tx.outgoing(id, Some(SUBCLASS_OF))
            .unwrap()
            .into_iter()
            .map(|e| e.to)
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // upsert
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_upsert_creates_nodes_and_edges() {
        let (store, merger) = merger();
        let nodes = vec![
            term("DOID:4", "disease"),
            term("DOID:162", "cancer").with_parent("DOID:4"),
        ];

        let outcome = merger.upsert(&nodes, &AuthContext::system()).unwrap();
        assert!(!outcome.is_degraded());
        assert_eq!(
            outcome.value,
            MergeSummary {
                nodes_created: 2,
                nodes_updated: 0,
                edges_created: 1,
                edges_dropped: 0,
            }
        );
        assert_eq!(parents_of(&store, "DOID:162"), vec!["DOID:4"]);
    }

    #[test]
    fn test_upsert_drops_dangling_parent() {
        let (store, merger) = merger();
        let nodes = vec![
            term("DOID:4", "disease"),
            term("DOID:162", "cancer")
                .with_parent("DOID:4")
                .with_parent("DOID:999"),
        ];

        let summary = merger.upsert(&nodes, &AuthContext::system()).unwrap().value;
        assert_eq!(summary.edges_created, 1);
        assert_eq!(summary.edges_dropped, 1);
        assert_eq!(parents_of(&store, "DOID:162"), vec!["DOID:4"]);
    }

    #[test]
    fn test_upsert_overwrites_per_key_and_keeps_others() {
        let (store, merger) = merger();
        let auth = AuthContext::system();
        merger
            .upsert(
                &[term("DOID:4", "disease").with_property("comment", "old")],
                &auth,
            )
            .unwrap();

        let mut update = NormalizedNode::new("DOID:4", "Entity").with_property("name", "disease");
        update.properties.insert(
            "synonym".into(),
            PropertyValue::Many(vec!["a".into(), "b".into(), "a".into()]),
        );
        let summary = merger.upsert(&[update], &auth).unwrap().value;
        assert_eq!(summary.nodes_updated, 1);

        let tx = store.begin().unwrap();
        let node = tx.get_node("DOID:4").unwrap().unwrap();
        assert_eq!(node.primary_label, "Term");
        assert!(node.has_tag("Entity"));
        assert_eq!(node.property("comment"), Some(&PropertyValue::Single("old".into())));
        assert_eq!(
            node.property("synonym"),
            Some(&PropertyValue::Many(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_upsert_resolves_parent_by_notation() {
        let (store, merger) = merger();
        let nodes = vec![
            NormalizedNode::new("http://example.org/A", "Entity").with_property("notation", "TEST:100"),
            NormalizedNode::new("http://example.org/B", "Entity").with_parent("TEST:100"),
        ];
        merger.upsert(&nodes, &AuthContext::system()).unwrap();
        assert_eq!(parents_of(&store, "http://example.org/B"), vec!["http://example.org/A"]);
    }

    #[test]
    fn test_upsert_rejects_empty_identifier() {
        let (_, merger) = merger();
        let err = merger
            .upsert(&[NormalizedNode::new(" ", "Term")], &AuthContext::system())
            .unwrap_err();
        assert!(matches!(err, MergeError::InvalidInput(_)));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // create_one / update_one
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_create_one_duplicate_writes_nothing() {
        let (store, merger) = merger();
        let auth = AuthContext::new("curator");
        merger.upsert(&[term("DOID:4", "disease"), term("DOID:5", "other")], &auth).unwrap();

        let err = merger
            .create_one(term("DOID:5", "again"), &["DOID:4".to_string()], "Term", &auth)
            .unwrap_err();
        assert!(matches!(err, MergeError::DuplicateIdentifier(ref id) if id == "DOID:5"));
        assert!(parents_of(&store, "DOID:5").is_empty());
    }

    #[test]
    fn test_create_one_lists_every_missing_parent() {
        let (store, merger) = merger();
        let auth = AuthContext::system();
        merger.upsert(&[term("DOID:4", "disease")], &auth).unwrap();

        let parents = vec!["DOID:4".to_string(), "X:1".to_string(), "X:2".to_string()];
        let err = merger
            .create_one(term("DOID:10", "new"), &parents, "Term", &auth)
            .unwrap_err();
        match err {
            MergeError::UnknownParent { identifier, missing } => {
                assert_eq!(identifier, "DOID:10");
                assert_eq!(missing, vec!["X:1", "X:2"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.begin().unwrap().get_node("DOID:10").unwrap().is_none());
    }

    #[test]
    fn test_create_one_strict_association_target() {
        let (_, merger) = merger();
        let mut node = term("DOID:10", "new");
        node.add_relation("has_symptom", "SYMP:1");
        let err = merger
            .create_one(node, &[], "Term", &AuthContext::system())
            .unwrap_err();
        assert!(matches!(err, MergeError::UnknownParent { .. }));
    }

    #[test]
    fn test_update_one_replaces_parents_and_label() {
        let (store, merger) = merger();
        let auth = AuthContext::system();
        let mut tagged = term("DOID:10", "child").with_parent("DOID:4");
        tagged.tags.insert("Imported".into());
        merger
            .upsert(&[term("DOID:4", "a"), term("DOID:5", "b"), tagged], &auth)
            .unwrap();

        let mut props = BTreeMap::new();
        props.insert("name".to_string(), PropertyValue::Single("renamed".into()));
        let updated = merger
            .update_one("DOID:10", props, &["DOID:5".to_string()], Some("Concept"), &auth)
            .unwrap()
            .into_value();

        assert_eq!(updated.primary_label, "Concept");
        assert!(updated.tags.contains("Imported"));
        assert_eq!(updated.parent_identifiers, vec!["DOID:5"]);
        assert_eq!(parents_of(&store, "DOID:10"), vec!["DOID:5"]);
        assert_eq!(
            updated.properties.keys().collect::<Vec<_>>(),
            vec!["name"]
        );
    }

    #[test]
    fn test_update_one_unknown_parent_leaves_node_untouched() {
        let (store, merger) = merger();
        let auth = AuthContext::system();
        merger
            .upsert(&[term("DOID:4", "a"), term("DOID:10", "child").with_parent("DOID:4")], &auth)
            .unwrap();

        let err = merger
            .update_one("DOID:10", BTreeMap::new(), &["NOPE:1".to_string()], None, &auth)
            .unwrap_err();
        assert!(matches!(err, MergeError::UnknownParent { .. }));
        assert_eq!(parents_of(&store, "DOID:10"), vec!["DOID:4"]);
        let tx = store.begin().unwrap();
        assert_eq!(tx.get_node("DOID:10").unwrap().unwrap().display_name(), "child");
    }

    #[test]
    fn test_update_one_not_found() {
        let (_, merger) = merger();
        let err = merger
            .update_one("DOID:1", BTreeMap::new(), &[], None, &AuthContext::system())
            .unwrap_err();
        assert!(matches!(err, MergeError::NotFound(_)));
    }

    #[test]
    fn test_mutation_rebuilds_index() {
        let (_, merger) = merger();
        merger
            .upsert(&[term("DOID:162", "cancer")], &AuthContext::system())
            .unwrap();
        assert_eq!(merger.index.document_count(), 1);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // degraded success
    // ═══════════════════════════════════════════════════════════════════════

    /// Hands out `allowed` transactions, then refuses to begin
    struct ExhaustedStore {
        inner: InMemoryGraphStore,
        allowed: usize,
        begun: AtomicUsize,
    }

    impl GraphStore for ExhaustedStore {
        fn begin(&self) -> ontograph_storage::Result<Box<dyn GraphTransaction + '_>> {
            if self.begun.fetch_add(1, Ordering::SeqCst) >= self.allowed {
                return Err(StorageError::transaction("connection pool exhausted"));
            }
            self.inner.begin()
        }
    }

    /// Merger whose first transaction commits and whose index rebuild fails
    fn merger_with_failing_rebuild() -> (InMemoryGraphStore, GraphMerger) {
        let inner = InMemoryGraphStore::new();
        let store = Arc::new(ExhaustedStore {
            inner: inner.clone(),
            allowed: 1,
            begun: AtomicUsize::new(0),
        });
        let index = Arc::new(SearchIndex::new(store.clone(), SearchConfig::default()));
        (inner, GraphMerger::new(store, index))
    }

    #[test]
    fn test_upsert_commits_when_rebuild_fails() {
        let (inner, merger) = merger_with_failing_rebuild();
        let nodes = vec![
            term("DOID:4", "disease"),
            term("DOID:162", "cancer").with_parent("DOID:4"),
        ];

        let outcome = merger.upsert(&nodes, &AuthContext::system()).unwrap();
        assert!(outcome.is_degraded());
        assert!(matches!(outcome.index_error, Some(IndexError::Storage(_))));
        assert_eq!(outcome.value.nodes_created, 2);

        assert_eq!(inner.node_count(), 2);
        assert_eq!(parents_of(&inner, "DOID:162"), vec!["DOID:4"]);
        // stale until the next successful rebuild
        assert!(!merger.index.is_built());
    }

    #[test]
    fn test_create_one_commits_when_rebuild_fails() {
        let (inner, merger) = merger_with_failing_rebuild();
        let outcome = merger
            .create_one(term("DOID:4", "disease"), &[], "Term", &AuthContext::system())
            .unwrap();

        assert!(outcome.is_degraded());
        assert!(matches!(outcome.index_error, Some(IndexError::Storage(_))));
        assert_eq!(outcome.value.identifier, "DOID:4");
        let tx = inner.begin().unwrap();
        assert!(tx.get_node("DOID:4").unwrap().is_some());
    }
}
