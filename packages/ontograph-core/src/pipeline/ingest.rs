//! Ingestion service
//!
//! Wires one graph store to the merger, the hierarchy engine, the search
//! index and the row normalizer, and runs whole-document ingestion.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use ontograph_storage::{GraphStore, InMemoryGraphStore};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::OntographConfig;
use crate::errors::Result;
use crate::features::hierarchy::HierarchyEngine;
use crate::features::merge::{GraphMerger, MergeSummary};
use crate::features::normalize::{normalize_all, NodeLabels};
use crate::features::parsing::{parse_bytes, ParseContext, SourceFormat};
use crate::features::row_normalize::RowNormalizer;
use crate::features::search::SearchIndex;
use crate::shared::{AuthContext, SearchHit, SubsetTable};

/// Outcome of one `ingest` call
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub format: SourceFormat,
    /// Records parsed into nodes
    pub parsed: usize,
    /// Records skipped with an error; the rest of the batch still merged
    pub record_errors: Vec<String>,
    pub summary: MergeSummary,
    /// Set when the data committed but the index rebuild failed
    pub index_error: Option<String>,
    pub elapsed_ms: u64,
    pub ingested_at: DateTime<Utc>,
}

pub struct OntographService {
    config: OntographConfig,
    subsets: Arc<SubsetTable>,
    store: Arc<dyn GraphStore>,
    index: Arc<SearchIndex>,
    merger: GraphMerger,
    hierarchy: HierarchyEngine,
    rows: RowNormalizer,
}

impl OntographService {
    pub fn with_store(config: OntographConfig, store: Arc<dyn GraphStore>) -> Self {
        let subsets = Arc::new(SubsetTable::with_overrides(&config.subsets));
        let index = Arc::new(SearchIndex::new(store.clone(), config.search.clone()));
        let merger = GraphMerger::new(store.clone(), index.clone());
        let hierarchy = HierarchyEngine::new(store.clone(), config.hierarchy.clone());
        let rows = RowNormalizer::new(store.clone(), &config.parallel);
        Self {
            config,
            subsets,
            store,
            index,
            merger,
            hierarchy,
            rows,
        }
    }

    pub fn in_memory(config: OntographConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryGraphStore::new()))
    }

    /// Open the configured store (SQLite when `storage.sqlite_path` is set)
    /// and build the search index over whatever it already holds.
    pub fn open(config: OntographConfig) -> Result<Self> {
        let store: Arc<dyn GraphStore> = match &config.storage.sqlite_path {
            #[cfg(feature = "sqlite")]
            Some(path) => {
                info!(path = %path.display(), "opening sqlite graph store");
                Arc::new(ontograph_storage::SqliteGraphStore::new(path)?)
            }
            #[cfg(not(feature = "sqlite"))]
            Some(path) => {
                warn!(path = %path.display(), "sqlite support disabled, using in-memory store");
                Arc::new(InMemoryGraphStore::new())
            }
            None => Arc::new(InMemoryGraphStore::new()),
        };
        let service = Self::with_store(config, store);
        service.index.rebuild()?;
        Ok(service)
    }

    pub fn config(&self) -> &OntographConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn merger(&self) -> &GraphMerger {
        &self.merger
    }

    pub fn hierarchy(&self) -> &HierarchyEngine {
        &self.hierarchy
    }

    pub fn rows(&self) -> &RowNormalizer {
        &self.rows
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn search(&self, query: &str, exclude: &[String]) -> Result<Vec<SearchHit>> {
        Ok(self.index.search(query, exclude)?)
    }

    /// Ingest with the configured source tag
    pub fn ingest(
        &self,
        bytes: &[u8],
        format_hint: Option<&str>,
        auth: &AuthContext,
    ) -> Result<IngestReport> {
        self.ingest_tagged(bytes, format_hint, &self.config.parsing.source_tag, auth)
    }

    pub fn ingest_tagged(
        &self,
        bytes: &[u8],
        format_hint: Option<&str>,
        source_tag: &str,
        auth: &AuthContext,
    ) -> Result<IngestReport> {
        let start = Instant::now();
        let ctx = ParseContext::new(source_tag, self.subsets.clone());
        let (format, output) = parse_bytes(bytes, format_hint, &ctx)?;

        let record_errors: Vec<String> = output.errors.iter().map(|e| e.to_string()).collect();
        for error in &record_errors {
            warn!(error = %error, "skipped record");
        }

        let label = match format {
            SourceFormat::Triple => &self.config.parsing.triple_label,
            SourceFormat::FlatText | SourceFormat::Structured => &self.config.parsing.term_label,
        };
        let nodes = normalize_all(&output.nodes, &NodeLabels::new(label.as_str()));
        let outcome = self.merger.upsert(&nodes, auth)?;

        let report = IngestReport {
            format,
            parsed: output.nodes.len(),
            record_errors,
            summary: outcome.value,
            index_error: outcome.index_error.map(|e| e.to_string()),
            elapsed_ms: start.elapsed().as_millis() as u64,
            ingested_at: Utc::now(),
        };
        info!(
            actor = auth.actor(),
            format = %report.format,
            parsed = report.parsed,
            skipped = report.record_errors.len(),
            created = report.summary.nodes_created,
            updated = report.summary.nodes_updated,
            elapsed_ms = report.elapsed_ms,
            "ingestion finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::OntographError;
    use crate::features::parsing::ParseError;

    const OBO: &str = "format-version: 1.2\n\n\
        [Term]\nid: DOID:4\nname: disease\n\n\
        [Term]\nid: DOID:162\nname: cancer\nis_a: DOID:4 ! disease\n\n\
        [Term]\nname: missing id\n";

    #[test]
    fn test_ingest_flat_text_reports_skipped_records() {
        let service = OntographService::in_memory(OntographConfig::default());
        let report = service
            .ingest(OBO.as_bytes(), Some("obo"), &AuthContext::system())
            .unwrap();

        assert_eq!(report.format, SourceFormat::FlatText);
        assert_eq!(report.parsed, 2);
        assert_eq!(report.record_errors.len(), 1);
        assert_eq!(report.summary.nodes_created, 2);
        assert_eq!(report.summary.edges_created, 1);
        assert!(report.index_error.is_none());

        let children = service.hierarchy().children("DOID:4").unwrap();
        assert_eq!(children[0].key, "DOID:162");
        assert_eq!(children[0].payload.primary_label, "Term");
    }

    #[test]
    fn test_ingest_rejects_bad_utf8() {
        let service = OntographService::in_memory(OntographConfig::default());
        let err = service
            .ingest(&[0xff, 0xfe, 0x00], None, &AuthContext::system())
            .unwrap_err();
        assert!(matches!(err, OntographError::Parse(ParseError::Encoding(_))));
    }

    #[test]
    fn test_reingest_updates_instead_of_duplicating() {
        let service = OntographService::in_memory(OntographConfig::default());
        let auth = AuthContext::system();
        service.ingest(OBO.as_bytes(), Some("obo"), &auth).unwrap();
        let report = service.ingest(OBO.as_bytes(), Some("obo"), &auth).unwrap();
        assert_eq!(report.summary.nodes_created, 0);
        assert_eq!(report.summary.nodes_updated, 2);
        assert_eq!(report.summary.edges_created, 0);
    }
}
