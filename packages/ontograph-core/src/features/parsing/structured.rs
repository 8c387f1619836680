//! Structured-record (JSON graph node) source
//!
//! Accepts one node object, an array of node objects, or an OBO-Graphs
//! document `{"graphs": [{"nodes": [...], "edges": [...]}]}`. Each node is
//! deserialized on its own so one bad record does not sink the batch.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::error::ParseError;
use super::flat_text::{ALTERNATIVE_ID, DEFINITION, DEFINITION_XREF};
use super::source::{ParseContext, ParseOutput, SourceFormat, SourceParser};
use crate::shared::vocab::{self, HAS_ALTERNATIVE_ID, HAS_OBO_NAMESPACE, IDENTIFIER, SYNONYM, TYPE};
use crate::shared::{RawNode, SynonymScope};

const IS_A: &str = "is_a";

#[derive(Debug, Deserialize)]
struct NodeRecord {
    id: Option<String>,
    lbl: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    meta: Option<Meta>,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Meta {
    definition: Option<DefinitionRecord>,
    subsets: Vec<String>,
    synonyms: Vec<ValueRecord>,
    xrefs: Vec<XrefRecord>,
    basic_property_values: Vec<ValueRecord>,
    comments: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DefinitionRecord {
    val: Option<String>,
    xrefs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ValueRecord {
    pred: String,
    val: String,
}

#[derive(Debug, Deserialize)]
struct XrefRecord {
    val: String,
}

#[derive(Debug, Clone, Deserialize)]
struct EdgeRecord {
    #[serde(default)]
    sub: Option<String>,
    pred: String,
    obj: String,
}

#[derive(Debug, Clone)]
pub struct StructuredParser {
    ctx: ParseContext,
}

impl StructuredParser {
    pub fn new(ctx: ParseContext) -> Self {
        Self { ctx }
    }

    fn convert(&self, record: NodeRecord, label: &str) -> Result<RawNode, ParseError> {
        let id = record
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ParseError::schema(label, "missing required field 'id'"))?;
        let name = record
            .lbl
            .ok_or_else(|| ParseError::schema(label, "missing required field 'lbl'"))?;

        let mut node = RawNode::new(id.clone());
        node.push("name", name);
        node.push(IDENTIFIER, vocab::term_code_from_iri(&id));
        node.push("ontology_id", id.as_str());
        if let Some(kind) = record.kind {
            node.type_hint = Some(kind.clone());
            node.push(TYPE, kind);
        }

        let meta = record.meta.unwrap_or_default();
        if let Some(definition) = meta.definition {
            if let Some(text) = definition.val {
                node.push(DEFINITION, text);
            }
            node.push_all(DEFINITION_XREF, definition.xrefs);
        }
        for synonym in meta.synonyms {
            match SynonymScope::from_predicate(&synonym.pred) {
                Some(scope) => node.push(SYNONYM, scope.annotate(&synonym.val)),
                None => debug!(record = label, pred = %synonym.pred, "skipping unscoped synonym"),
            }
        }
        node.push_all("xref", meta.xrefs.into_iter().map(|x| x.val));
        for uri in &meta.subsets {
            let entry = self.ctx.subsets.resolve(vocab::fragment(uri));
            if !node.subsets.contains(&entry) {
                node.subsets.push(entry);
            }
        }
        for property in meta.basic_property_values {
            match property.pred.as_str() {
                HAS_ALTERNATIVE_ID => node.push(ALTERNATIVE_ID, property.val),
                HAS_OBO_NAMESPACE => node.push("namespace", property.val),
                _ => {}
            }
        }
        node.push_all("comment", meta.comments);

        for edge in record.edges {
            let target = vocab::term_code_from_iri(&edge.obj);
            if edge.pred == IS_A {
                node.push(IS_A, target);
            } else {
                node.associate(vocab::fragment(&edge.pred), target);
            }
        }

        Ok(node)
    }
}

impl SourceParser for StructuredParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Structured
    }

    fn parse(&self, text: &str) -> Result<ParseOutput, ParseError> {
        let document: Value = serde_json::from_str(text)?;
        let mut output = ParseOutput::default();

        for (index, mut value) in node_values(document)?.into_iter().enumerate() {
            let label = format!("node[{}]", index);
            if !value.is_object() {
                output
                    .errors
                    .push(ParseError::schema(&label, "expected a JSON object"));
                continue;
            }
            // `"edges": null` reads as no edges
            if let Some(edges) = value.get_mut("edges") {
                if edges.is_null() {
                    *edges = Value::Array(Vec::new());
                }
            }
            let record: NodeRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    output.errors.push(ParseError::schema(&label, e.to_string()));
                    continue;
                }
            };
            match self.convert(record, &label) {
                Ok(node) => output.nodes.push(node),
                Err(e) => output.errors.push(e),
            }
        }

        debug!(
            records = output.nodes.len(),
            errors = output.errors.len(),
            "parsed structured records"
        );
        Ok(output)
    }
}

/// Flatten the three accepted document shapes into node objects.
fn node_values(document: Value) -> Result<Vec<Value>, ParseError> {
    match document {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("graphs") {
            Some(Value::Array(graphs)) => {
                let mut nodes = Vec::new();
                for graph in graphs {
                    nodes.extend(graph_nodes(graph));
                }
                Ok(nodes)
            }
            Some(_) => Err(ParseError::schema("graphs", "expected an array")),
            None => Ok(vec![Value::Object(map)]),
        },
        _ => Err(ParseError::schema(
            "document",
            "expected an object or an array of objects",
        )),
    }
}

/// Nodes of one graph with the graph-level edges attached to their `sub`.
fn graph_nodes(mut graph: Value) -> Vec<Value> {
    let edges: Vec<EdgeRecord> = graph
        .get_mut("edges")
        .map(Value::take)
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    let mut nodes = match graph.get_mut("nodes").map(Value::take) {
        Some(Value::Array(nodes)) => nodes,
        _ => Vec::new(),
    };

    for node in nodes.iter_mut() {
        let Some(id) = node.get("id").and_then(Value::as_str).map(str::to_string) else {
            continue;
        };
        let own: Vec<Value> = edges
            .iter()
            .filter(|e| e.sub.as_deref() == Some(id.as_str()))
            .map(|e| serde_json::json!({ "sub": id, "pred": e.pred, "obj": e.obj }))
            .collect();
        if own.is_empty() {
            continue;
        }
        if let Some(map) = node.as_object_mut() {
            match map.get_mut("edges") {
                Some(Value::Array(existing)) => existing.extend(own),
                _ => {
                    map.insert("edges".to_string(), Value::Array(own));
                }
            }
        }
    }
    nodes
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::shared::SubsetTable;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> ParseOutput {
        StructuredParser::new(ParseContext::new("DOID", Arc::new(SubsetTable::default())))
            .parse(text)
            .unwrap()
    }

    const NODE: &str = r#"{
        "id": "http://purl.obolibrary.org/obo/DOID_0001816",
        "lbl": "angiosarcoma",
        "type": "CLASS",
        "meta": {
            "definition": {"val": "A vascular cancer.", "xrefs": ["NCI:C3088"]},
            "subsets": ["http://purl.obolibrary.org/obo/doid#DO_cancer_slim"],
            "synonyms": [
                {"pred": "hasExactSynonym", "val": "hemangiosarcoma"},
                {"pred": "hasSynonymType", "val": "ignored"}
            ],
            "xrefs": [{"val": "MESH:D006394"}],
            "basicPropertyValues": [
                {"pred": "http://www.geneontology.org/formats/oboInOwl#hasAlternativeId", "val": "DOID:4508"},
                {"pred": "http://www.geneontology.org/formats/oboInOwl#hasOBONamespace", "val": "disease_ontology"}
            ]
        },
        "edges": [
            {"pred": "is_a", "obj": "http://purl.obolibrary.org/obo/DOID_175"},
            {"pred": "http://purl.obolibrary.org/obo/RO_0004026", "obj": "http://purl.obolibrary.org/obo/UBERON_0001981"}
        ]
    }"#;

    #[test]
    fn test_single_node_fields() {
        let output = parse(NODE);
        assert!(output.errors.is_empty());
        let node = &output.nodes[0];

        assert_eq!(node.subject_uri, "http://purl.obolibrary.org/obo/DOID_0001816");
        assert_eq!(node.first("identifier"), Some("DOID:0001816"));
        assert_eq!(node.first("name"), Some("angiosarcoma"));
        assert_eq!(node.first("definition"), Some("A vascular cancer."));
        assert_eq!(node.values("definition_xref"), ["NCI:C3088".to_string()]);
        assert_eq!(node.values("synonym"), ["hemangiosarcoma [EXACT]".to_string()]);
        assert_eq!(node.values("xref"), ["MESH:D006394".to_string()]);
        assert_eq!(node.values("alternative_id"), ["DOID:4508".to_string()]);
        assert_eq!(node.values("namespace"), ["disease_ontology".to_string()]);
        assert_eq!(node.subsets[0].code, "DO_cancer_slim");
        assert_eq!(node.values("is_a"), ["DOID:175".to_string()]);
        assert_eq!(
            node.associated_terms.get("RO_0004026"),
            Some(&vec!["UBERON:0001981".to_string()])
        );
    }

    #[test]
    fn test_array_with_bad_record() {
        let output = parse(r#"[{"id": "http://x/A_1", "lbl": "a"}, {"id": "http://x/B_2"}, 42]"#);
        assert_eq!(output.nodes.len(), 1);
        assert_eq!(output.errors.len(), 2);
        match &output.errors[0] {
            ParseError::Schema { record, message } => {
                assert_eq!(record, "node[1]");
                assert!(message.contains("lbl"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_obo_graph_document_edges_attached() {
        let output = parse(
            r#"{"graphs": [{
                "nodes": [
                    {"id": "http://x/T_1", "lbl": "root"},
                    {"id": "http://x/T_2", "lbl": "child"}
                ],
                "edges": [{"sub": "http://x/T_2", "pred": "is_a", "obj": "http://x/T_1"}]
            }]}"#,
        );
        assert_eq!(output.nodes.len(), 2);
        assert!(output.nodes[0].values("is_a").is_empty());
        assert_eq!(output.nodes[1].values("is_a"), ["T:1".to_string()]);
    }

    #[test]
    fn test_not_json_is_fatal() {
        let parser =
            StructuredParser::new(ParseContext::new("X", Arc::new(SubsetTable::default())));
        assert!(matches!(parser.parse("{oops"), Err(ParseError::Json(_))));
    }
}
