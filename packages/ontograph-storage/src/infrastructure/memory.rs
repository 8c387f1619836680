//! In-memory graph store
//!
//! Each transaction reads from an `Arc` snapshot taken at `begin` and
//! copies it on first write. Writes are journaled and replayed onto the
//! live state at commit, so concurrent transactions are last-writer-wins
//! per node rather than per whole graph.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::domain::{GraphEdge, GraphNode, GraphStore, GraphTransaction};
use crate::{Result, StorageError};

/// Secondary key → identifiers. A key may be shared; lookups take the
/// smallest identifier.
type KeyIndex = HashMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Default)]
struct GraphState {
    nodes: BTreeMap<String, GraphNode>,
    /// from → edges
    outgoing: HashMap<String, BTreeSet<GraphEdge>>,
    /// to → edges
    incoming: HashMap<String, BTreeSet<GraphEdge>>,
    by_notation: KeyIndex,
    by_uri: KeyIndex,
}

fn index_key(index: &mut KeyIndex, key: Option<&str>, identifier: &str) {
    if let Some(key) = key {
        index
            .entry(key.to_string())
            .or_default()
            .insert(identifier.to_string());
    }
}

fn unindex_key(index: &mut KeyIndex, key: Option<&str>, identifier: &str) {
    if let Some(key) = key {
        if let Some(ids) = index.get_mut(key) {
            ids.remove(identifier);
            if ids.is_empty() {
                index.remove(key);
            }
        }
    }
}

impl GraphState {
    fn outgoing<'a>(
        &'a self,
        identifier: &str,
        relation: Option<&'a str>,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.outgoing
            .get(identifier)
            .into_iter()
            .flatten()
            .filter(move |e| relation.map_or(true, |r| e.relation == r))
    }

    fn incoming<'a>(
        &'a self,
        identifier: &str,
        relation: Option<&'a str>,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.incoming
            .get(identifier)
            .into_iter()
            .flatten()
            .filter(move |e| relation.map_or(true, |r| e.relation == r))
    }

    fn has_edge(&self, edge: &GraphEdge) -> bool {
        self.outgoing
            .get(&edge.from)
            .map_or(false, |edges| edges.contains(edge))
    }

    fn edge_count(&self) -> usize {
        self.outgoing.values().map(BTreeSet::len).sum()
    }

    fn lookup<'a>(&'a self, index: &'a KeyIndex, key: &str) -> Option<&'a GraphNode> {
        index
            .get(key)
            .and_then(|ids| ids.iter().next())
            .and_then(|id| self.nodes.get(id))
    }

    /// identifier, then notation
    fn find_by_key(&self, key: &str) -> Option<&GraphNode> {
        self.nodes
            .get(key)
            .or_else(|| self.lookup(&self.by_notation, key))
    }

    fn apply(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::PutNode(node) => {
                let id = node.identifier.as_str();
                if let Some(old) = self.nodes.insert(id.to_string(), node.clone()) {
                    unindex_key(&mut self.by_notation, old.notation(), id);
                    unindex_key(&mut self.by_uri, old.uri(), id);
                }
                index_key(&mut self.by_notation, node.notation(), id);
                index_key(&mut self.by_uri, node.uri(), id);
            }
            Mutation::CreateEdge(edge) => {
                // Endpoints may have vanished under a concurrent writer.
                if self.nodes.contains_key(&edge.from) && self.nodes.contains_key(&edge.to) {
                    self.outgoing
                        .entry(edge.from.clone())
                        .or_default()
                        .insert(edge.clone());
                    self.incoming
                        .entry(edge.to.clone())
                        .or_default()
                        .insert(edge.clone());
                }
            }
            Mutation::DeleteOutgoing { from, relation } => {
                let Some(edges) = self.outgoing.get_mut(from) else {
                    return;
                };
                let removed: Vec<GraphEdge> = edges
                    .iter()
                    .filter(|e| e.relation == *relation)
                    .cloned()
                    .collect();
                for edge in &removed {
                    edges.remove(edge);
                    if let Some(targets) = self.incoming.get_mut(&edge.to) {
                        targets.remove(edge);
                        if targets.is_empty() {
                            self.incoming.remove(&edge.to);
                        }
                    }
                }
                if edges.is_empty() {
                    self.outgoing.remove(from);
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Mutation {
    PutNode(GraphNode),
    CreateEdge(GraphEdge),
    DeleteOutgoing { from: String, relation: String },
}

/// In-memory `GraphStore`
#[derive(Clone, Default)]
pub struct InMemoryGraphStore {
    state: Arc<RwLock<Arc<GraphState>>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes
    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    /// Number of stored edges
    pub fn edge_count(&self) -> usize {
        self.state.read().edge_count()
    }
}

impl GraphStore for InMemoryGraphStore {
    fn begin(&self) -> Result<Box<dyn GraphTransaction + '_>> {
        let view = self.state.read().clone();
        Ok(Box::new(InMemoryTransaction {
            live: &self.state,
            view,
            journal: Vec::new(),
            finished: false,
        }))
    }
}

struct InMemoryTransaction<'a> {
    live: &'a RwLock<Arc<GraphState>>,
    view: Arc<GraphState>,
    journal: Vec<Mutation>,
    finished: bool,
}

impl InMemoryTransaction<'_> {
    fn record(&mut self, mutation: Mutation) {
        Arc::make_mut(&mut self.view).apply(&mutation);
        self.journal.push(mutation);
    }
}

impl GraphTransaction for InMemoryTransaction<'_> {
    fn get_node(&self, identifier: &str) -> Result<Option<GraphNode>> {
        Ok(self.view.nodes.get(identifier).cloned())
    }

    fn find_by_key(&self, key: &str) -> Result<Option<GraphNode>> {
        Ok(self.view.find_by_key(key).cloned())
    }

    fn resolve_reference(&self, reference: &str) -> Result<Option<GraphNode>> {
        Ok(self
            .view
            .find_by_key(reference)
            .or_else(|| self.view.lookup(&self.view.by_uri, reference))
            .cloned())
    }

    fn find_by_label(&self, label: &str) -> Result<Vec<GraphNode>> {
        Ok(self
            .view
            .nodes
            .values()
            .filter(|n| n.matches_label(label))
            .cloned()
            .collect())
    }

    fn nodes(&self) -> Result<Vec<GraphNode>> {
        Ok(self.view.nodes.values().cloned().collect())
    }

    fn nodes_with_key_prefix(&self, prefix: &str) -> Result<Vec<GraphNode>> {
        Ok(self
            .view
            .nodes
            .values()
            .filter(|n| n.key().starts_with(prefix))
            .cloned()
            .collect())
    }

    fn create_node(&mut self, node: &GraphNode) -> Result<()> {
        if self.view.nodes.contains_key(&node.identifier) {
            return Err(StorageError::conflict(&node.identifier));
        }
        self.record(Mutation::PutNode(node.clone()));
        Ok(())
    }

    fn put_node(&mut self, node: &GraphNode) -> Result<()> {
        self.record(Mutation::PutNode(node.clone()));
        Ok(())
    }

    fn create_edge(&mut self, edge: &GraphEdge) -> Result<bool> {
        if !self.view.nodes.contains_key(&edge.from) || !self.view.nodes.contains_key(&edge.to) {
            return Err(StorageError::dangling_edge(
                &edge.from,
                &edge.relation,
                &edge.to,
            ));
        }
        if self.view.has_edge(edge) {
            return Ok(false);
        }
        self.record(Mutation::CreateEdge(edge.clone()));
        Ok(true)
    }

    fn delete_outgoing(&mut self, from: &str, relation: &str) -> Result<usize> {
        let count = self.view.outgoing(from, Some(relation)).count();
        if count > 0 {
            self.record(Mutation::DeleteOutgoing {
                from: from.to_string(),
                relation: relation.to_string(),
            });
        }
        Ok(count)
    }

    fn outgoing(&self, identifier: &str, relation: Option<&str>) -> Result<Vec<GraphEdge>> {
        Ok(self.view.outgoing(identifier, relation).cloned().collect())
    }

    fn incoming(&self, identifier: &str, relation: Option<&str>) -> Result<Vec<GraphEdge>> {
        Ok(self.view.incoming(identifier, relation).cloned().collect())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.finished = true;
        if self.journal.is_empty() {
            return Ok(());
        }
        let mut live = self.live.write();
        let state = Arc::make_mut(&mut *live);
        for mutation in &self.journal {
            state.apply(mutation);
        }
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

impl Drop for InMemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.journal.is_empty() {
            warn!(
                pending = self.journal.len(),
                "transaction dropped without commit, discarding writes"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PropertyValue;
    use crate::ErrorKind;

    fn term(id: &str) -> GraphNode {
        GraphNode::new(id, "Term")
    }

    #[test]
    fn test_commit_publishes_writes() {
        let store = InMemoryGraphStore::new();
        let mut tx = store.begin().unwrap();
        tx.create_node(&term("DOID:4")).unwrap();
        tx.commit().unwrap();

        assert_eq!(store.node_count(), 1);
        let tx = store.begin().unwrap();
        assert!(tx.get_node("DOID:4").unwrap().is_some());
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let store = InMemoryGraphStore::new();
        {
            let mut tx = store.begin().unwrap();
            tx.create_node(&term("DOID:4")).unwrap();
            // Own writes are visible inside the transaction
            assert!(tx.get_node("DOID:4").unwrap().is_some());
        }
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn test_create_node_conflict() {
        let store = InMemoryGraphStore::new();
        let mut tx = store.begin().unwrap();
        tx.create_node(&term("DOID:4")).unwrap();
        let err = tx.create_node(&term("DOID:4")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let store = InMemoryGraphStore::new();
        let mut tx = store.begin().unwrap();
        tx.create_node(&term("DOID:162")).unwrap();
        let err = tx
            .create_edge(&GraphEdge::new("DOID:162", "SUBCLASS_OF", "DOID:4"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DanglingEdge);
    }

    #[test]
    fn test_edges_are_a_set() {
        let store = InMemoryGraphStore::new();
        let mut tx = store.begin().unwrap();
        tx.create_node(&term("DOID:4")).unwrap();
        tx.create_node(&term("DOID:162")).unwrap();
        let edge = GraphEdge::new("DOID:162", "SUBCLASS_OF", "DOID:4");
        assert!(tx.create_edge(&edge).unwrap());
        assert!(!tx.create_edge(&edge).unwrap());
        tx.commit().unwrap();
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn test_delete_outgoing_only_named_relation() {
        let store = InMemoryGraphStore::new();
        let mut tx = store.begin().unwrap();
        for id in ["A", "B", "C"] {
            tx.create_node(&term(id)).unwrap();
        }
        tx.create_edge(&GraphEdge::new("A", "SUBCLASS_OF", "B")).unwrap();
        tx.create_edge(&GraphEdge::new("A", "has_part", "C")).unwrap();
        assert_eq!(tx.delete_outgoing("A", "SUBCLASS_OF").unwrap(), 1);
        tx.commit().unwrap();

        let tx = store.begin().unwrap();
        let remaining = tx.outgoing("A", None).unwrap();
        assert_eq!(remaining, vec![GraphEdge::new("A", "has_part", "C")]);
    }

    #[test]
    fn test_resolve_reference_by_uri_and_notation() {
        let store = InMemoryGraphStore::new();
        let mut tx = store.begin().unwrap();
        let node = GraphNode::new("TEST:100", "Entity")
            .with_property("notation", PropertyValue::Single("TEST:100".into()))
            .with_property("uri", PropertyValue::Single("http://example.org/A".into()));
        tx.create_node(&node).unwrap();

        let by_uri = tx.resolve_reference("http://example.org/A").unwrap();
        assert_eq!(by_uri.map(|n| n.identifier), Some("TEST:100".to_string()));
        assert!(tx.find_by_key("http://example.org/A").unwrap().is_none());
    }

    #[test]
    fn test_concurrent_commits_merge_per_node() {
        let store = InMemoryGraphStore::new();
        let mut first = store.begin().unwrap();
        let mut second = store.begin().unwrap();
        first.create_node(&term("A")).unwrap();
        second.create_node(&term("B")).unwrap();
        first.commit().unwrap();
        second.commit().unwrap();
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn test_key_lookup_follows_notation_changes() {
        let store = InMemoryGraphStore::new();
        let mut tx = store.begin().unwrap();
        let node = GraphNode::new("TEST_100", "Entity")
            .with_property("notation", PropertyValue::Single("TEST:100".into()));
        tx.create_node(&node).unwrap();
        tx.commit().unwrap();

        let mut tx = store.begin().unwrap();
        let renamed = GraphNode::new("TEST_100", "Entity")
            .with_property("notation", PropertyValue::Single("TEST:200".into()));
        tx.put_node(&renamed).unwrap();
        assert!(tx.find_by_key("TEST:100").unwrap().is_none());
        tx.commit().unwrap();

        let tx = store.begin().unwrap();
        assert!(tx.find_by_key("TEST:100").unwrap().is_none());
        let found = tx.find_by_key("TEST:200").unwrap();
        assert_eq!(found.map(|n| n.identifier), Some("TEST_100".to_string()));
    }

    #[test]
    fn test_incoming_tracks_deleted_edges() {
        let store = InMemoryGraphStore::new();
        let mut tx = store.begin().unwrap();
        for id in ["A", "B", "C"] {
            tx.create_node(&term(id)).unwrap();
        }
        tx.create_edge(&GraphEdge::new("B", "SUBCLASS_OF", "A")).unwrap();
        tx.create_edge(&GraphEdge::new("C", "SUBCLASS_OF", "A")).unwrap();
        tx.commit().unwrap();

        let mut tx = store.begin().unwrap();
        tx.delete_outgoing("B", "SUBCLASS_OF").unwrap();
        tx.create_edge(&GraphEdge::new("B", "SUBCLASS_OF", "C")).unwrap();
        tx.commit().unwrap();

        let tx = store.begin().unwrap();
        assert_eq!(
            tx.incoming("A", Some("SUBCLASS_OF")).unwrap(),
            vec![GraphEdge::new("C", "SUBCLASS_OF", "A")]
        );
        assert_eq!(
            tx.incoming("C", None).unwrap(),
            vec![GraphEdge::new("B", "SUBCLASS_OF", "C")]
        );
        assert_eq!(store.edge_count(), 2);
    }
}
