//! Feature modules, leaves first
//!
//! parsing → normalize → merge → (hierarchy, search, row_normalize)

pub mod hierarchy;
pub mod merge;
pub mod normalize;
pub mod parsing;
pub mod row_normalize;
pub mod search;
