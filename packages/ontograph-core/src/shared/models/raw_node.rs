//! Parser output

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::subset::SubsetEntry;

/// Synonym scope, the closed vocabulary shared by all parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SynonymScope {
    Exact,
    Related,
    Narrow,
    Broad,
}

impl SynonymScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynonymScope::Exact => "EXACT",
            SynonymScope::Related => "RELATED",
            SynonymScope::Narrow => "NARROW",
            SynonymScope::Broad => "BROAD",
        }
    }

    /// Scope of an oboInOwl synonym predicate (`hasExactSynonym`, ...),
    /// short or full IRI.
    pub fn from_predicate(predicate: &str) -> Option<Self> {
        match crate::shared::vocab::fragment(predicate) {
            "hasExactSynonym" => Some(SynonymScope::Exact),
            "hasRelatedSynonym" => Some(SynonymScope::Related),
            "hasNarrowSynonym" => Some(SynonymScope::Narrow),
            "hasBroadSynonym" => Some(SynonymScope::Broad),
            _ => None,
        }
    }

    /// `"text [SCOPE]"`, the stored synonym form
    pub fn annotate(&self, text: &str) -> String {
        format!("{} [{}]", text, self.as_str())
    }
}

impl fmt::Display for SynonymScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SynonymScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXACT" => Ok(SynonymScope::Exact),
            "RELATED" => Ok(SynonymScope::Related),
            "NARROW" => Ok(SynonymScope::Narrow),
            "BROAD" => Ok(SynonymScope::Broad),
            other => Err(format!("unknown synonym scope '{}'", other)),
        }
    }
}

/// One parsed record, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNode {
    /// Subject IRI, or the term code for flat formats
    pub subject_uri: String,
    /// Predicate name → values in source order
    pub properties: BTreeMap<String, Vec<String>>,
    pub type_hint: Option<String>,
    pub subsets: Vec<SubsetEntry>,
    /// Relation name → target codes
    pub associated_terms: BTreeMap<String, Vec<String>>,
}

impl RawNode {
    pub fn new(subject_uri: impl Into<String>) -> Self {
        Self {
            subject_uri: subject_uri.into(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, predicate: impl Into<String>, value: impl Into<String>) {
        self.properties
            .entry(predicate.into())
            .or_default()
            .push(value.into());
    }

    pub fn push_all<I, S>(&mut self, predicate: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self.push(predicate, value);
        }
    }

    pub fn associate(&mut self, relation: impl Into<String>, target: impl Into<String>) {
        self.associated_terms
            .entry(relation.into())
            .or_default()
            .push(target.into());
    }

    pub fn values(&self, predicate: &str) -> &[String] {
        self.properties
            .get(predicate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn first(&self, predicate: &str) -> Option<&str> {
        self.values(predicate).first().map(String::as_str)
    }
}
