//! Shared fixtures for ontograph-core integration tests

#![allow(dead_code)]

use ontograph_core::{AuthContext, HierarchyTreeNode, NormalizedNode, OntographConfig, OntographService};

/// Two triple-source entities, B under A
pub const TEST_TURTLE: &str = r#"
@prefix ex: <http://example.org/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .

ex:A a owl:Class .
ex:A skos:notation "100" .
ex:B owl:subClassOf ex:A .
ex:B skos:notation "200" .
"#;

/// Small disease hierarchy in flat-text form
///
/// ```text
/// DOID:4 disease
/// ├── DOID:162 cancer
/// │   └── DOID:1612 breast cancer ─┐
/// └── DOID:14566 ─────────────────┘
/// ```
pub const DOID_OBO: &str = "format-version: 1.2
ontology: doid

[Term]
id: DOID:4
name: disease
subset: DO_AGR_slim

[Term]
id: DOID:162
name: cancer
synonym: \"malignant neoplasm\" EXACT []
is_a: DOID:4 ! disease

[Term]
id: DOID:14566
name: disease of cellular proliferation
is_a: DOID:4 ! disease

[Term]
id: DOID:1612
name: breast cancer
synonym: \"mammary cancer\" EXACT []
is_a: DOID:162 ! cancer
is_a: DOID:14566 ! disease of cellular proliferation
relationship: has_material_basis_in DOID:0000000 ! unknown

[Typedef]
id: has_material_basis_in
name: has material basis in
";

/// OBO-Graphs export with one is_a edge
pub const DOID_JSON: &str = r#"{
  "graphs": [{
    "nodes": [
      {"id": "http://purl.obolibrary.org/obo/DOID_4", "lbl": "disease", "type": "CLASS"},
      {"id": "http://purl.obolibrary.org/obo/DOID_162", "lbl": "cancer", "type": "CLASS",
       "meta": {"synonyms": [{"pred": "hasExactSynonym", "val": "malignant neoplasm"}]}}
    ],
    "edges": [
      {"sub": "http://purl.obolibrary.org/obo/DOID_162", "pred": "is_a",
       "obj": "http://purl.obolibrary.org/obo/DOID_4"}
    ]
  }]
}"#;

pub fn service() -> OntographService {
    OntographService::in_memory(OntographConfig::default())
}

pub fn auth() -> AuthContext {
    AuthContext::new("test-suite")
}

pub fn loaded(source: &str, hint: &str, tag: &str) -> OntographService {
    let service = service();
    service
        .ingest_tagged(source.as_bytes(), Some(hint), tag, &auth())
        .unwrap();
    service
}

pub fn term(id: &str, name: &str) -> NormalizedNode {
    NormalizedNode::new(id, "Term").with_property("name", name)
}

pub fn keys(nodes: &[HierarchyTreeNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.key.as_str()).collect()
}
