//! Read-only hierarchy queries over SUBCLASS_OF edges
//!
//! Lazily loaded trees: `root_entries` and `children` return nodes with
//! `loading: true`; callers expand them one level at a time.

pub mod engine;
pub mod error;

pub use engine::HierarchyEngine;
pub use error::{HierarchyError, HierarchyResult};

pub use crate::shared::vocab::source_of;
