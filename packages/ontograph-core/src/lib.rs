/*
 * Ontograph - Ontology Ingestion & Hierarchy Engine
 *
 * Feature-First Architecture:
 * - shared/      : Vocabulary, models, subset table
 * - config/      : YAML configuration with validation
 * - features/    : Vertical slices (parsing → normalize → merge → hierarchy / search / rows)
 * - pipeline/    : Whole-document ingestion service
 *
 * Storage is reached through the `ontograph-storage` transaction port.
 */

#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports
// ═══════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod errors;
pub mod features;
pub mod pipeline;
pub mod shared;

pub use config::OntographConfig;
pub use errors::{OntographError, Result};
pub use features::hierarchy::{source_of, HierarchyEngine, HierarchyError};
pub use features::merge::{GraphMerger, MergeError, MergeOutcome, MergeSummary};
pub use features::normalize::{normalize, normalize_all, NodeLabels};
pub use features::parsing::{parse_bytes, ParseContext, ParseError, ParseOutput, SourceFormat};
pub use features::row_normalize::{CellResolution, RowNormalizer};
pub use features::search::{IndexError, IndexStats, SearchIndex};
pub use pipeline::{IngestReport, OntographService};
pub use shared::{
    AuthContext, EntrySummary, HierarchyTreeNode, NormalizedNode, RawNode, SearchHit,
    SubsetEntry, SubsetTable, SynonymScope,
};
