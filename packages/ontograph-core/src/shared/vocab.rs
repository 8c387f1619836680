//! Canonical vocabulary
//!
//! Relation names, property keys, labels and the namespace table used to
//! short-form predicate IRIs.

/// Reserved hierarchy relation
pub const SUBCLASS_OF: &str = "SUBCLASS_OF";

/// Property keys extracted into `parent_identifiers`
pub const HIERARCHY_KEYS: [&str; 2] = ["subClassOf", "is_a"];

/// Relation names in association tables that mean the hierarchy relation
pub const HIERARCHY_RELATIONS: [&str; 3] = [SUBCLASS_OF, "subClassOf", "is_a"];

pub const NOTATION: &str = "notation";
pub const IDENTIFIER: &str = "identifier";
pub const URI: &str = "uri";
pub const TYPE: &str = "type";
pub const SYNONYM: &str = "synonym";
pub const SUBSET: &str = "subset";
pub const SUBSET_DEFINITION: &str = "subset_definition";

/// Properties holding a display name
pub const LABEL_KEYS: [&str; 3] = ["prefLabel", "label", "name"];

/// Properties holding alternate names
pub const ALT_LABEL_KEYS: [&str; 2] = ["altLabel", "synonym"];

/// Internal marker for nodes included in the search index
pub const SEARCHABLE_TAG: &str = "Searchable";

/// Primary labels of account nodes, never indexed
pub const ACCOUNT_LABELS: [&str; 2] = ["User", "Account"];

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

pub const OBO_IN_OWL: &str = "http://www.geneontology.org/formats/oboInOwl#";
pub const HAS_ALTERNATIVE_ID: &str = "http://www.geneontology.org/formats/oboInOwl#hasAlternativeId";
pub const HAS_OBO_NAMESPACE: &str = "http://www.geneontology.org/formats/oboInOwl#hasOBONamespace";

/// Namespaces stripped from predicate IRIs
pub const KNOWN_NAMESPACES: [(&str, &str); 9] = [
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("oboInOwl", OBO_IN_OWL),
    ("obo", "http://purl.obolibrary.org/obo/"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
];

/// Strip a known namespace from a predicate IRI; unknown IRIs pass through.
pub fn short_predicate(iri: &str) -> &str {
    KNOWN_NAMESPACES
        .iter()
        .find_map(|(_, ns)| iri.strip_prefix(ns))
        .filter(|local| !local.is_empty())
        .unwrap_or(iri)
}

/// Whether `relation` names the hierarchy relation.
pub fn is_hierarchy_relation(relation: &str) -> bool {
    HIERARCHY_RELATIONS.contains(&relation)
}

/// Lowercased source prefix of a code: `"DOID:4"` → `"doid"`.
pub fn source_of(code: &str) -> String {
    code.split(':').next().unwrap_or(code).to_lowercase()
}

/// `http://purl.obolibrary.org/obo/DOID_0001816` → `DOID:0001816`.
///
/// Every underscore of the last path segment is rewritten.
pub fn term_code_from_iri(iri: &str) -> String {
    iri.rsplit('/').next().unwrap_or(iri).replace('_', ":")
}

/// Fragment after `#`, or the whole string when there is none.
pub fn fragment(iri: &str) -> &str {
    iri.rsplit('#').next().unwrap_or(iri)
}
