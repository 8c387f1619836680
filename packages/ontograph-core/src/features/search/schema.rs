//! Search index schema
//!
//! 1. `code` - lookup key (STORED, raw keyword)
//! 2. `name` - display labels (STORED, tokenized)
//! 3. `alt_label` - synonyms without scope suffix (tokenized)
//! 4. `identifier` - identifier and key (STORED first value, tokenized)

use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, TEXT,
};

pub const FIELD_CODE: &str = "code";
pub const FIELD_NAME: &str = "name";
pub const FIELD_ALT_LABEL: &str = "alt_label";
pub const FIELD_IDENTIFIER: &str = "identifier";

/// Schema plus its field handles
#[derive(Debug, Clone)]
pub struct SchemaFields {
    pub schema: Schema,
    pub code: Field,
    pub name: Field,
    pub alt_label: Field,
    pub identifier: Field,
}

impl SchemaFields {
    pub fn new() -> Self {
        let mut builder = Schema::builder();

        let keyword = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer("raw")
                    .set_index_option(IndexRecordOption::Basic),
            )
            .set_stored();

        let code = builder.add_text_field(FIELD_CODE, keyword);
        let name = builder.add_text_field(FIELD_NAME, TEXT | STORED);
        let alt_label = builder.add_text_field(FIELD_ALT_LABEL, TEXT);
        let identifier = builder.add_text_field(FIELD_IDENTIFIER, TEXT | STORED);

        Self {
            schema: builder.build(),
            code,
            name,
            alt_label,
            identifier,
        }
    }
}

impl Default for SchemaFields {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_has_4_fields() {
        assert_eq!(SchemaFields::new().schema.fields().count(), 4);
    }

    #[test]
    fn test_alt_label_not_stored() {
        let fields = SchemaFields::new();
        assert!(!fields.schema.get_field_entry(fields.alt_label).is_stored());
        assert!(fields.schema.get_field_entry(fields.code).is_stored());
    }
}
