//! Graph-triple source (Turtle, N-Triples)
//!
//! Triples are grouped by subject IRI into `RawNode`s, first-seen order.
//! Predicates are short-formed against the known namespaces; synonym
//! predicates fold into `synonym` and `inSubset` objects become subset
//! entries. Blank-node subjects and blank-node objects are not emitted.

mod chars;
mod lexer;
mod parser;
mod token;

use std::collections::HashMap;

use tracing::debug;

pub use parser::{parse_document, Term, Triple};

use super::error::ParseError;
use super::source::{ParseContext, ParseOutput, SourceFormat, SourceParser};
use crate::shared::vocab::{self, IDENTIFIER, NOTATION, RDF_TYPE, SYNONYM};
use crate::shared::{RawNode, SynonymScope};

const IN_SUBSET: &str = "inSubset";

#[derive(Debug, Clone)]
pub struct TripleParser {
    ctx: ParseContext,
}

impl TripleParser {
    pub fn new(ctx: ParseContext) -> Self {
        Self { ctx }
    }

    fn apply(&self, node: &mut RawNode, predicate_iri: &str, value: String) {
        if predicate_iri == RDF_TYPE && node.type_hint.is_none() {
            node.type_hint = Some(value.clone());
        }

        let predicate = vocab::short_predicate(predicate_iri);
        if let Some(scope) = SynonymScope::from_predicate(predicate) {
            push_unique(node, SYNONYM, scope.annotate(&value));
            return;
        }

        match predicate {
            IN_SUBSET => {
                let entry = self.ctx.subsets.resolve(vocab::fragment(&value));
                if !node.subsets.contains(&entry) {
                    node.subsets.push(entry);
                }
            }
            NOTATION => {
                let notation = format!("{}:{}", self.ctx.source_tag, value);
                push_unique(node, NOTATION, notation);
            }
            IDENTIFIER => push_unique(node, IDENTIFIER, value.replacen('_', ":", 1)),
            other => push_unique(node, other, value),
        }
    }
}

/// Identical triples are stored once
fn push_unique(node: &mut RawNode, predicate: &str, value: String) {
    if !node.values(predicate).contains(&value) {
        node.push(predicate, value);
    }
}

impl SourceParser for TripleParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Triple
    }

    fn parse(&self, text: &str) -> Result<ParseOutput, ParseError> {
        let triples = parse_document(text)?;
        let total = triples.len();

        let mut nodes: Vec<RawNode> = Vec::new();
        let mut by_subject: HashMap<String, usize> = HashMap::new();
        let mut skipped = 0usize;

        for triple in triples {
            let Term::Iri(subject) = triple.subject else {
                skipped += 1;
                continue;
            };
            let index = *by_subject.entry(subject).or_insert_with_key(|subject| {
                nodes.push(RawNode::new(subject.clone()));
                nodes.len() - 1
            });
            let value = match triple.object {
                Term::Iri(iri) => iri,
                Term::Literal { lexical, .. } => lexical,
                Term::Blank(_) => {
                    skipped += 1;
                    continue;
                }
            };
            self.apply(&mut nodes[index], &triple.predicate, value);
        }

        debug!(
            triples = total,
            nodes = nodes.len(),
            skipped_blank = skipped,
            "grouped triples by subject"
        );

        Ok(ParseOutput {
            nodes,
            errors: Vec::new(),
        })
    }
}
