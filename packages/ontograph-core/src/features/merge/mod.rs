//! Graph merger: `NormalizedNode`s → stored nodes and edges
//!
//! - `upsert`: lenient batch path, dangling targets dropped
//! - `create_one` / `update_one`: strict single-node paths
//!
//! Every mutation is followed by a search index rebuild.

pub mod error;
pub mod merger;

pub use error::{MergeError, MergeResult};
pub use merger::{GraphMerger, MergeOutcome, MergeSummary};
