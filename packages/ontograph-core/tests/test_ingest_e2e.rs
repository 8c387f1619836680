//! Whole-document ingestion through every source family

mod common;

use std::collections::BTreeSet;

use common::{keys, loaded, DOID_JSON, DOID_OBO, TEST_TURTLE};
use ontograph_core::{normalize_all, parse_bytes, NodeLabels, ParseContext, SourceFormat, SubsetTable};
use ontograph_storage::PropertyValue;
use pretty_assertions::assert_eq;
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════════════════
// Triple sources
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_triple_source_builds_tagged_hierarchy() {
    let service = loaded(TEST_TURTLE, "ttl", "TEST");

    let roots = service.hierarchy().root_entries("TEST").unwrap();
    assert_eq!(keys(&roots), vec!["TEST:100"]);
    assert_eq!(roots[0].payload.primary_label, "Entity");
    assert_eq!(roots[0].payload.uri(), Some("http://example.org/A"));
    assert!(!roots[0].is_leaf);

    let children = service.hierarchy().children("TEST:100").unwrap();
    assert_eq!(keys(&children), vec!["TEST:200"]);
    assert_eq!(children[0].parents[0].code, "TEST:100");
    assert!(children[0].is_leaf);
}

#[test]
fn test_triple_format_is_sniffed_without_hint() {
    let service = common::service();
    let report = service
        .ingest_tagged(TEST_TURTLE.as_bytes(), None, "TEST", &common::auth())
        .unwrap();
    assert_eq!(report.format, SourceFormat::Triple);
    assert_eq!(report.summary.nodes_created, 2);
    assert_eq!(report.summary.edges_created, 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Flat-text sources
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_flat_text_parents_equal_is_a_codes() {
    let ctx = ParseContext::new("DOID", Arc::new(SubsetTable::default()));
    let (_, output) = parse_bytes(DOID_OBO.as_bytes(), Some("obo"), &ctx).unwrap();
    let nodes = normalize_all(&output.nodes, &NodeLabels::new("Term"));

    let breast = nodes.iter().find(|n| n.identifier == "DOID:1612").unwrap();
    let parents: BTreeSet<&str> = breast.parent_identifiers.iter().map(String::as_str).collect();
    assert_eq!(parents, BTreeSet::from(["DOID:162", "DOID:14566"]));
    assert_eq!(
        breast.relations.get("has_material_basis_in"),
        Some(&vec!["DOID:0000000".to_string()])
    );
}

#[test]
fn test_flat_text_ingest_drops_unknown_relationship_target() {
    let service = common::service();
    let report = service
        .ingest(DOID_OBO.as_bytes(), Some("obo"), &common::auth())
        .unwrap();

    assert_eq!(report.parsed, 4);
    assert_eq!(report.summary.nodes_created, 4);
    assert_eq!(report.summary.edges_created, 4);
    assert_eq!(report.summary.edges_dropped, 1);

    let roots = service.hierarchy().root_entries("DOID").unwrap();
    assert_eq!(keys(&roots), vec!["DOID:4"]);
    let subset = roots[0].payload.property("subset").unwrap();
    assert_eq!(subset, &PropertyValue::Single("DO_AGR_slim".into()));
}

#[test]
fn test_ancestors_after_flat_text_ingest() {
    let service = loaded(DOID_OBO, "obo", "DOID");
    let ancestors = service.hierarchy().ancestors("DOID:1612").unwrap();
    let ids: Vec<&str> = ancestors.iter().map(|n| n.identifier.as_str()).collect();
    assert_eq!(ids.first(), Some(&"DOID:4"));
    assert_eq!(ids.len(), 3);
}

// ═══════════════════════════════════════════════════════════════════════════
// Structured sources
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_structured_source_links_is_a_edges() {
    let service = loaded(DOID_JSON, "json", "DOID");

    let children = service.hierarchy().children("DOID:4").unwrap();
    assert_eq!(keys(&children), vec!["DOID:162"]);
    assert_eq!(children[0].label, "cancer");
    assert_eq!(children[0].payload.primary_label, "Term");
}

#[test]
fn test_mixed_sources_share_one_graph() {
    let service = loaded(DOID_JSON, "json", "DOID");
    let report = service
        .ingest(DOID_OBO.as_bytes(), Some("obo"), &common::auth())
        .unwrap();

    // DOID:4 and DOID:162 already came from the JSON export
    assert_eq!(report.summary.nodes_updated, 2);
    assert_eq!(report.summary.nodes_created, 2);
    assert_eq!(service.hierarchy().list_entries().unwrap().len(), 4);
}
