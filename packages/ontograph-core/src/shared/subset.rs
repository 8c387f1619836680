//! Subset definitions
//!
//! Immutable table from subset code to description, built once at startup
//! and shared as `Arc<SubsetTable>`. Unknown codes resolve to themselves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `{subset_code, definition}` pair attached to parsed records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsetEntry {
    pub code: String,
    pub definition: String,
}

const DISEASE_ONTOLOGY_SUBSETS: [(&str, &str); 18] = [
    ("DO_AGR_slim", "Subset for the Alliance of Genome Resources."),
    ("DO_cancer_slim", "A subset focused on cancer terms."),
    ("DO_CFDE_slim", "Subset for the CFDE (Common Fund Data Ecosystem)."),
    (
        "DO_FlyBase_slim",
        "Subset for FlyBase, a database of Drosophila genes and genomes.",
    ),
    ("DO_GXD_slim", "Subset for the Gene Expression Database."),
    ("DO_IEDB_slim", "Subset for the Immune Epitope Database."),
    (
        "DO_infectious_disease_slim",
        "Subset focusing on infectious diseases.",
    ),
    ("DO_MGI_slim", "Subset for the Mouse Genome Informatics database."),
    ("DO_RAD_slim", "Subset for rare diseases."),
    ("DO_rare_slim", "Another subset focused on rare diseases."),
    ("GOLD", "Genomes OnLine Database subset."),
    (
        "gram-negative_bacterial_infectious_disease",
        "Subset for gram-negative bacterial infectious diseases.",
    ),
    (
        "gram-positive_bacterial_infectious_disease",
        "Subset for gram-positive bacterial infectious diseases.",
    ),
    ("NCIthesaurus", "National Cancer Institute Thesaurus subset."),
    (
        "sexually_transmitted_infectious_disease",
        "Subset for sexually transmitted infectious diseases.",
    ),
    (
        "tick-borne_infectious_disease",
        "Subset for tick-borne infectious diseases.",
    ),
    (
        "TopNodes_DOcancerslim",
        "Subset for top nodes in the cancer slim.",
    ),
    (
        "zoonotic_infectious_disease",
        "Subset for zoonotic infectious diseases.",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetTable {
    definitions: BTreeMap<String, String>,
}

impl SubsetTable {
    /// Empty table: every code resolves to itself
    pub fn empty() -> Self {
        Self {
            definitions: BTreeMap::new(),
        }
    }

    /// Disease Ontology slim definitions
    pub fn disease_ontology() -> Self {
        Self {
            definitions: DISEASE_ONTOLOGY_SUBSETS
                .iter()
                .map(|(code, def)| (code.to_string(), def.to_string()))
                .collect(),
        }
    }

    /// Built-in table with `extra` entries layered on top
    pub fn with_overrides(extra: &BTreeMap<String, String>) -> Self {
        let mut table = Self::disease_ontology();
        table
            .definitions
            .extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        table
    }

    /// Description of `code`, or `code` itself when unregistered
    pub fn definition<'a>(&'a self, code: &'a str) -> &'a str {
        self.definitions.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn resolve(&self, code: &str) -> SubsetEntry {
        SubsetEntry {
            code: code.to_string(),
            definition: self.definition(code).to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for SubsetTable {
    fn default() -> Self {
        Self::disease_ontology()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_size() {
        assert_eq!(SubsetTable::disease_ontology().len(), 18);
    }

    #[test]
    fn test_known_code() {
        let table = SubsetTable::default();
        assert_eq!(
            table.definition("DO_cancer_slim"),
            "A subset focused on cancer terms."
        );
    }

    #[test]
    fn test_unknown_code_falls_back_to_code() {
        let table = SubsetTable::default();
        let entry = table.resolve("my_private_slim");
        assert_eq!(entry.code, "my_private_slim");
        assert_eq!(entry.definition, "my_private_slim");
    }

    #[test]
    fn test_overrides_layer_on_builtin() {
        let mut extra = BTreeMap::new();
        extra.insert("GOLD".to_string(), "Gold standard.".to_string());
        extra.insert("custom".to_string(), "Custom.".to_string());

        let table = SubsetTable::with_overrides(&extra);
        assert_eq!(table.len(), 19);
        assert_eq!(table.definition("GOLD"), "Gold standard.");
    }
}
