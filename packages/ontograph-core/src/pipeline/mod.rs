//! Ingestion pipeline
//!
//! `(bytes, format_hint) → parse → normalize → upsert → index rebuild`

pub mod ingest;

pub use ingest::{IngestReport, OntographService};
