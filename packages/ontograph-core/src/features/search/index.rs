//! Search index maintainer
//!
//! ```text
//! rebuild():  tag unmarked nodes "Searchable" (accounts excluded) → commit
//!             → fresh in-RAM index over every marked node → swap handle
//! search():   sanitize → BM25 (name boosted, optional fuzzy) → drop excluded
//!             → truncate to max_results
//! ```
//!
//! The index handle sits behind a `RwLock` and is replaced wholesale, so
//! readers never observe a half-built index.

use std::sync::Arc;
use std::time::Instant;

use ontograph_storage::{strip_scope, GraphNode, GraphStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{Index, IndexReader, IndexWriter, TantivyDocument};
use tracing::{debug, info};

use super::error::IndexError;
use super::schema::SchemaFields;
use crate::config::SearchConfig;
use crate::shared::vocab::{ACCOUNT_LABELS, ALT_LABEL_KEYS, LABEL_KEYS, SEARCHABLE_TAG};
use crate::shared::SearchHit;

const NAME_BOOST: f32 = 2.0;

/// Result of one rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Documents in the new index
    pub documents: usize,
    /// Nodes that received the searchable marker during this rebuild
    pub newly_tagged: usize,
    pub elapsed_ms: u64,
}

struct IndexState {
    index: Index,
    reader: IndexReader,
    documents: usize,
}

pub struct SearchIndex {
    store: Arc<dyn GraphStore>,
    config: SearchConfig,
    fields: SchemaFields,
    state: RwLock<Option<IndexState>>,
}

/// Account nodes never enter the index
pub fn is_account(node: &GraphNode) -> bool {
    ACCOUNT_LABELS.contains(&node.primary_label.as_str())
}

/// Query-syntax characters become spaces and the text is lowercased, so
/// `AND`, `OR`, `NOT` and `IN` reach the parser as plain words. The name
/// and synonym fields are lowercased at index time.
pub fn sanitize_query(query: &str) -> String {
    query
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl SearchIndex {
    pub fn new(store: Arc<dyn GraphStore>, config: SearchConfig) -> Self {
        Self {
            store,
            config,
            fields: SchemaFields::new(),
            state: RwLock::new(None),
        }
    }

    pub fn is_built(&self) -> bool {
        self.state.read().is_some()
    }

    /// Documents in the current index, 0 before the first rebuild
    pub fn document_count(&self) -> usize {
        self.state.read().as_ref().map(|s| s.documents).unwrap_or(0)
    }

    pub fn rebuild(&self) -> Result<IndexStats, IndexError> {
        let start = Instant::now();

        let mut tx = self.store.begin()?;
        let mut marked = Vec::new();
        let mut newly_tagged = 0usize;
        for mut node in tx.nodes()? {
            if is_account(&node) {
                continue;
            }
            if !node.has_tag(SEARCHABLE_TAG) {
                node.tags.insert(SEARCHABLE_TAG.to_string());
                tx.put_node(&node)?;
                newly_tagged += 1;
            }
            marked.push(node);
        }
        tx.commit()?;

        let index = Index::create_in_ram(self.fields.schema.clone());
        let mut writer: IndexWriter =
            index.writer_with_num_threads(1, self.config.writer_heap_bytes)?;
        for node in &marked {
            writer.add_document(self.document(node))?;
        }
        writer.commit()?;
        let reader = index.reader()?;

        let documents = marked.len();
        *self.state.write() = Some(IndexState {
            index,
            reader,
            documents,
        });

        let stats = IndexStats {
            documents,
            newly_tagged,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            documents = stats.documents,
            newly_tagged = stats.newly_tagged,
            elapsed_ms = stats.elapsed_ms,
            "search index rebuilt"
        );
        Ok(stats)
    }

    fn document(&self, node: &GraphNode) -> TantivyDocument {
        let mut doc = TantivyDocument::default();
        doc.add_text(self.fields.code, node.key());
        doc.add_text(self.fields.identifier, &node.identifier);
        if node.key() != node.identifier {
            doc.add_text(self.fields.identifier, node.key());
        }

        doc.add_text(self.fields.name, node.display_name());
        for key in LABEL_KEYS {
            for value in node.property(key).map(|v| v.values()).unwrap_or_default() {
                if value != node.display_name() {
                    doc.add_text(self.fields.name, value);
                }
            }
        }
        for key in ALT_LABEL_KEYS {
            for value in node.property(key).map(|v| v.values()).unwrap_or_default() {
                doc.add_text(self.fields.alt_label, strip_scope(value));
            }
        }
        doc
    }

    /// Ranked hits for `query`, never returning a code listed in `exclude`.
    ///
    /// Empty after sanitizing, or no index built yet → empty result.
    pub fn search(&self, query: &str, exclude: &[String]) -> Result<Vec<SearchHit>, IndexError> {
        let sanitized = sanitize_query(query);
        if sanitized.is_empty() {
            return Ok(Vec::new());
        }

        let guard = self.state.read();
        let Some(state) = guard.as_ref() else {
            debug!("search before first index rebuild");
            return Ok(Vec::new());
        };

        let mut parser = QueryParser::for_index(
            &state.index,
            vec![self.fields.name, self.fields.alt_label, self.fields.identifier],
        );
        parser.set_field_boost(self.fields.name, NAME_BOOST);
        if self.config.enable_fuzzy {
            let distance = self.config.fuzzy_distance;
            parser.set_field_fuzzy(self.fields.name, false, distance, true);
            parser.set_field_fuzzy(self.fields.alt_label, false, distance, true);
        }
        let parsed = parser
            .parse_query(&sanitized)
            .map_err(|e| IndexError::InvalidQuery(e.to_string()))?;

        let limit = self.config.max_results + exclude.len();
        let searcher = state.reader.searcher();
        let top_docs = searcher.search(&parsed, &TopDocs::with_limit(limit))?;

        let mut hits = Vec::new();
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let code = doc
                .get_first(self.fields.code)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let identifier = doc
                .get_first(self.fields.identifier)
                .and_then(|v| v.as_str())
                .unwrap_or("");
            if exclude.iter().any(|x| *x == code || x == identifier) {
                continue;
            }
            let name = doc
                .get_first(self.fields.name)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            hits.push(SearchHit { name, code, score });
            if hits.len() == self.config.max_results {
                break;
            }
        }

        debug!(query = %sanitized, hits = hits.len(), "search");
        Ok(hits)
    }
}
