//! Shared vocabulary, models and the subset table

pub mod models;
pub mod subset;
pub mod vocab;

pub use models::{
    AuthContext, EntrySummary, HierarchyTreeNode, NormalizedNode, RawNode, SearchHit, SynonymScope,
};
pub use subset::{SubsetEntry, SubsetTable};
