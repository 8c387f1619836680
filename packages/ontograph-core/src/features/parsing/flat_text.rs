//! Flat-text (OBO) source
//!
//! Line-oriented stanza grammar. Only `[Term]` stanzas produce records;
//! header tags and `[Typedef]` / `[Instance]` stanzas are skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::error::ParseError;
use super::source::{ParseContext, ParseOutput, SourceFormat, SourceParser};
use crate::shared::vocab::{IDENTIFIER, SYNONYM};
use crate::shared::{RawNode, SynonymScope};

static STANZA_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([A-Za-z]+)\]\s*$").expect("valid stanza regex"));

static TAG_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_-]*):\s*(.*)$").expect("valid tag regex"));

/// `"text" [xref, xref]`
static DEF_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^"((?:[^"\\]|\\.)*)"\s*(?:\[(.*)\])?"#).expect("valid def regex")
});

/// `"text" SCOPE [xrefs]`
static SYNONYM_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^"((?:[^"\\]|\\.)*)"\s+(EXACT|RELATED|NARROW|BROAD)\b"#)
        .expect("valid synonym regex")
});

/// `rel target ! label`
static RELATIONSHIP_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\S+)\s+([^\s!]+)(?:\s*!\s*(.*))?$").expect("valid relationship regex")
});

/// `predicate value [datatype]`, value quoted or bare
static PROPERTY_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\S+)\s+(?:"((?:[^"\\]|\\.)*)"|(\S+))"#).expect("valid property_value regex")
});

pub const DEFINITION: &str = "definition";
pub const DEFINITION_XREF: &str = "definition_xref";
pub const ALTERNATIVE_ID: &str = "alternative_id";
pub const RELATIONSHIP: &str = "relationship";
pub const EXACT_MATCH: &str = "exact_match";
pub const CONFORMS_TO: &str = "conforms_to";

/// Tags copied verbatim (value up to a trailing `!` comment)
const VERBATIM_TAGS: [&str; 6] = [
    "name",
    "comment",
    "namespace",
    "is_obsolete",
    "created_by",
    "creation_date",
];

#[derive(Debug, Clone)]
pub struct FlatTextParser {
    ctx: ParseContext,
}

/// `[Term]` stanza under construction
struct TermStanza {
    line: usize,
    node: RawNode,
    id: Option<String>,
}

impl TermStanza {
    fn new(line: usize) -> Self {
        Self {
            line,
            node: RawNode::default(),
            id: None,
        }
    }

    fn finish(self) -> Result<RawNode, ParseError> {
        let id = self
            .id
            .ok_or_else(|| ParseError::record(self.line, "[Term] stanza has no id"))?;
        let mut node = self.node;
        node.subject_uri = id;
        Ok(node)
    }
}

impl FlatTextParser {
    pub fn new(ctx: ParseContext) -> Self {
        Self { ctx }
    }

    fn apply_tag(&self, stanza: &mut TermStanza, line: usize, tag: &str, value: &str) {
        let node = &mut stanza.node;
        match tag {
            "id" => {
                let id = first_token(value);
                if stanza.id.is_none() && !id.is_empty() {
                    stanza.id = Some(id.to_string());
                    node.push(IDENTIFIER, id);
                }
            }
            "def" => match DEF_VALUE.captures(value) {
                Some(caps) => {
                    node.push(DEFINITION, unescape(&caps[1]));
                    if let Some(xrefs) = caps.get(2) {
                        node.push_all(DEFINITION_XREF, split_xrefs(xrefs.as_str()));
                    }
                }
                None => debug!(line, value, "skipping malformed def"),
            },
            "subset" => {
                let entry = self.ctx.subsets.resolve(first_token(value));
                if !node.subsets.contains(&entry) {
                    node.subsets.push(entry);
                }
            }
            "synonym" => match SYNONYM_VALUE.captures(value) {
                Some(caps) => {
                    let scope: SynonymScope = match caps[2].parse() {
                        Ok(scope) => scope,
                        Err(_) => return,
                    };
                    node.push(SYNONYM, scope.annotate(&unescape(&caps[1])));
                }
                None => debug!(line, value, "skipping malformed synonym"),
            },
            "xref" => push_token(node, "xref", value),
            "alt_id" => push_token(node, ALTERNATIVE_ID, value),
            "is_a" => {
                let code = first_token(value);
                if code.is_empty() {
                    debug!(line, "skipping empty is_a");
                } else {
                    node.push("is_a", code);
                }
            }
            "relationship" => match RELATIONSHIP_VALUE.captures(value) {
                Some(caps) => {
                    let relation = &caps[1];
                    let target = &caps[2];
                    let label = caps.get(3).map(|m| m.as_str().trim()).unwrap_or("");
                    node.associate(relation, target);
                    let text = if label.is_empty() {
                        format!("{} {}", relation, target)
                    } else {
                        format!("{} {} {}", relation, target, label)
                    };
                    node.push(RELATIONSHIP, text);
                }
                None => debug!(line, value, "skipping malformed relationship"),
            },
            "intersection_of" => {
                let expr = strip_comment(value);
                if !expr.is_empty() {
                    node.push("intersection_of", expr);
                }
            }
            "property_value" => {
                let Some(caps) = PROPERTY_VALUE.captures(value) else {
                    debug!(line, value, "skipping malformed property_value");
                    return;
                };
                let key = match local_part(&caps[1]) {
                    "exactMatch" => EXACT_MATCH,
                    "conformsTo" | "conforms_to" => CONFORMS_TO,
                    _ => return,
                };
                let text = caps
                    .get(2)
                    .map(|m| unescape(m.as_str()))
                    .or_else(|| caps.get(3).map(|m| m.as_str().to_string()))
                    .unwrap_or_default();
                node.push(key, text);
            }
            tag if VERBATIM_TAGS.contains(&tag) => {
                let text = strip_comment(value);
                if !text.is_empty() {
                    node.push(tag, text);
                }
            }
            _ => {}
        }
    }
}

impl SourceParser for FlatTextParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::FlatText
    }

    fn parse(&self, text: &str) -> Result<ParseOutput, ParseError> {
        let mut output = ParseOutput::default();
        let mut current: Option<TermStanza> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('!') {
                continue;
            }

            if let Some(caps) = STANZA_HEADER.captures(line) {
                if let Some(stanza) = current.take() {
                    collect(&mut output, stanza.finish());
                }
                if &caps[1] == "Term" {
                    current = Some(TermStanza::new(line_no));
                }
                continue;
            }

            let Some(stanza) = current.as_mut() else {
                continue;
            };
            match TAG_LINE.captures(line) {
                Some(caps) => self.apply_tag(stanza, line_no, &caps[1], caps[2].trim()),
                None => debug!(line = line_no, "skipping line without tag"),
            }
        }

        if let Some(stanza) = current.take() {
            collect(&mut output, stanza.finish());
        }

        debug!(
            records = output.nodes.len(),
            errors = output.errors.len(),
            "parsed flat-text stanzas"
        );
        Ok(output)
    }
}

fn collect(output: &mut ParseOutput, result: Result<RawNode, ParseError>) {
    match result {
        Ok(node) => output.nodes.push(node),
        Err(e) => output.errors.push(e),
    }
}

fn first_token(value: &str) -> &str {
    value.split_whitespace().next().unwrap_or("")
}

fn push_token(node: &mut RawNode, key: &str, value: &str) {
    let token = first_token(value);
    if !token.is_empty() {
        node.push(key, token);
    }
}

/// Text before a trailing `! comment`
fn strip_comment(value: &str) -> &str {
    value.split(" !").next().unwrap_or(value).trim()
}

/// `skos:exactMatch` / `http://…#exactMatch` → `exactMatch`
fn local_part(predicate: &str) -> &str {
    predicate
        .rsplit(|c: char| c == ':' || c == '#' || c == '/')
        .next()
        .unwrap_or(predicate)
}

fn split_xrefs(list: &str) -> Vec<String> {
    list.split(',')
        .map(|x| unescape(first_token(x)))
        .filter(|x| !x.is_empty())
        .collect()
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
