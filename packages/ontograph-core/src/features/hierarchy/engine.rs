//! Hierarchy query engine
//!
//! Edge direction is child → parent (`child SUBCLASS_OF parent`):
//!
//! - roots: no outgoing SUBCLASS_OF
//! - children of P: sources of P's incoming SUBCLASS_OF edges
//! - ancestors of N: closure over N's outgoing SUBCLASS_OF edges

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use ontograph_storage::{GraphNode, GraphStore, GraphTransaction};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use super::error::{HierarchyError, HierarchyResult};
use crate::config::HierarchyConfig;
use crate::features::search::is_account;
use crate::shared::vocab::SUBCLASS_OF;
use crate::shared::{EntrySummary, HierarchyTreeNode};

pub struct HierarchyEngine {
    store: Arc<dyn GraphStore>,
    config: HierarchyConfig,
}

fn sort_by_key(nodes: &mut [HierarchyTreeNode]) {
    nodes.sort_by(|a, b| a.key.cmp(&b.key));
}

fn lookup(tx: &dyn GraphTransaction, key: &str) -> HierarchyResult<GraphNode> {
    tx.find_by_key(key)?
        .ok_or_else(|| HierarchyError::NotFound(key.to_string()))
}

/// Stored SUBCLASS_OF children of `identifier`, deduplicated by identifier
fn child_nodes(tx: &dyn GraphTransaction, identifier: &str) -> HierarchyResult<Vec<GraphNode>> {
    let mut children = BTreeMap::new();
    for edge in tx.incoming(identifier, Some(SUBCLASS_OF))? {
        if children.contains_key(&edge.from) {
            continue;
        }
        if let Some(child) = tx.get_node(&edge.from)? {
            children.insert(edge.from, child);
        }
    }
    Ok(children.into_values().collect())
}

fn has_children(tx: &dyn GraphTransaction, identifier: &str) -> HierarchyResult<bool> {
    Ok(!tx.incoming(identifier, Some(SUBCLASS_OF))?.is_empty())
}

impl HierarchyEngine {
    pub fn new(store: Arc<dyn GraphStore>, config: HierarchyConfig) -> Self {
        Self { store, config }
    }

    /// Top-level entries of one source: keys starting `prefix:` with no
    /// SUBCLASS_OF parent. A root is a leaf only when nothing of any
    /// relation points at it.
    pub fn root_entries(&self, source_prefix: &str) -> HierarchyResult<Vec<HierarchyTreeNode>> {
        let tx = self.store.begin()?;
        let prefix = format!("{}:", source_prefix);

        let mut roots = Vec::new();
        for node in tx.nodes_with_key_prefix(&prefix)? {
            if !tx.outgoing(&node.identifier, Some(SUBCLASS_OF))?.is_empty() {
                continue;
            }
            let is_leaf = tx.incoming(&node.identifier, None)?.is_empty();
            roots.push(HierarchyTreeNode::lazy(node, is_leaf));
        }
        sort_by_key(&mut roots);

        debug!(prefix = %prefix, roots = roots.len(), "root entries");
        Ok(roots)
    }

    /// Direct SUBCLASS_OF children of the node keyed `parent_key`, each
    /// carrying its complete parent list.
    pub fn children(&self, parent_key: &str) -> HierarchyResult<Vec<HierarchyTreeNode>> {
        let tx = self.store.begin()?;
        let parent = lookup(tx.as_ref(), parent_key)?;

        let mut result = Vec::new();
        for child in child_nodes(tx.as_ref(), &parent.identifier)? {
            let mut parents = Vec::new();
            for edge in tx.outgoing(&child.identifier, Some(SUBCLASS_OF))? {
                if let Some(p) = tx.get_node(&edge.to)? {
                    let summary = EntrySummary::of(&p);
                    if !parents.contains(&summary) {
                        parents.push(summary);
                    }
                }
            }
            parents.sort_by(|a, b| a.code.cmp(&b.code));
            let is_leaf = !has_children(tx.as_ref(), &child.identifier)?;
            let mut entry = HierarchyTreeNode::lazy(child, is_leaf);
            entry.parents = parents;
            result.push(entry);
        }
        sort_by_key(&mut result);
        Ok(result)
    }

    /// Every distinct ancestor of `start_key`, root first, start excluded.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `start_key` matches no node
    /// - `CycleDetected` if the reachable SUBCLASS_OF edges contain a cycle
    /// - `DepthExceeded` if the walk goes past `max_ancestor_depth` levels
    pub fn ancestors(&self, start_key: &str) -> HierarchyResult<Vec<GraphNode>> {
        let tx = self.store.begin()?;
        let start = lookup(tx.as_ref(), start_key)?;
        let limit = self.config.max_ancestor_depth;

        let mut graph: DiGraph<GraphNode, ()> = DiGraph::new();
        let mut indices: HashMap<String, NodeIndex> = HashMap::new();
        let start_idx = graph.add_node(start.clone());
        indices.insert(start.identifier.clone(), start_idx);

        let mut queue = VecDeque::from([(start.identifier.clone(), start_idx, 0usize)]);
        while let Some((identifier, idx, depth)) = queue.pop_front() {
            for edge in tx.outgoing(&identifier, Some(SUBCLASS_OF))? {
                let parent_idx = match indices.get(&edge.to) {
                    Some(existing) => *existing,
                    None => {
                        if depth + 1 > limit {
                            return Err(HierarchyError::DepthExceeded { limit });
                        }
                        let Some(parent) = tx.get_node(&edge.to)? else {
                            continue;
                        };
                        let parent_idx = graph.add_node(parent);
                        indices.insert(edge.to.clone(), parent_idx);
                        queue.push_back((edge.to.clone(), parent_idx, depth + 1));
                        parent_idx
                    }
                };
                graph.add_edge(idx, parent_idx, ());
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            let key = graph[cycle.node_id()].key().to_string();
            HierarchyError::CycleDetected(key)
        })?;

        let ancestors: Vec<GraphNode> = order
            .into_iter()
            .rev()
            .filter(|idx| *idx != start_idx)
            .map(|idx| graph[idx].clone())
            .collect();

        debug!(start = %start.identifier, ancestors = ancestors.len(), "ancestor walk");
        Ok(ancestors)
    }

    /// Eagerly expand `key` down to `depth` levels (capped by
    /// `max_subtree_depth`). Each node appears once; unexpanded frontier
    /// nodes keep `loading: true`.
    pub fn subtree(&self, key: &str, depth: usize) -> HierarchyResult<HierarchyTreeNode> {
        let tx = self.store.begin()?;
        let root = lookup(tx.as_ref(), key)?;
        let depth = depth.min(self.config.max_subtree_depth);

        let mut visited = HashSet::new();
        visited.insert(root.identifier.clone());
        self.expand(tx.as_ref(), root, depth, &mut visited)
    }

    fn expand(
        &self,
        tx: &dyn GraphTransaction,
        node: GraphNode,
        remaining: usize,
        visited: &mut HashSet<String>,
    ) -> HierarchyResult<HierarchyTreeNode> {
        let is_leaf = !has_children(tx, &node.identifier)?;
        let identifier = node.identifier.clone();
        let mut entry = HierarchyTreeNode::lazy(node, is_leaf);

        if is_leaf {
            entry.loading = false;
            return Ok(entry);
        }
        if remaining == 0 {
            return Ok(entry);
        }

        entry.loading = false;
        for child in child_nodes(tx, &identifier)? {
            if !visited.insert(child.identifier.clone()) {
                continue;
            }
            entry.children.push(self.expand(tx, child, remaining - 1, visited)?);
        }
        sort_by_key(&mut entry.children);
        Ok(entry)
    }

    /// `(name, code)` of every non-account node, sorted by code
    pub fn list_entries(&self) -> HierarchyResult<Vec<EntrySummary>> {
        let tx = self.store.begin()?;
        let mut entries: Vec<EntrySummary> = tx
            .nodes()?
            .iter()
            .filter(|node| !is_account(node))
            .map(EntrySummary::of)
            .collect();
        entries.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(entries)
    }
}
