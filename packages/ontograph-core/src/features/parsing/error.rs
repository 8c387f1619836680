//! Parse errors

use thiserror::Error;

/// Error raised while turning source bytes into `RawNode`s
///
/// `Record` and `Schema` errors are per-record and collected alongside the
/// parsed nodes; the others abort the whole document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Invalid token in a triple document
    #[error("Lexer error at line {line}, column {column}: {message}")]
    Lexer {
        line: usize,
        column: usize,
        message: String,
    },

    /// Unexpected token or invalid structure
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// Prefixed name used before its `@prefix` declaration
    #[error("Undefined prefix '{prefix}' at line {line}")]
    UndefinedPrefix { prefix: String, line: usize },

    /// Structured record missing a required field
    #[error("Schema error in {record}: {message}")]
    Schema { record: String, message: String },

    /// Flat-text record that cannot produce a node
    #[error("Record error at line {line}: {message}")]
    Record { line: usize, message: String },

    /// Source is not valid UTF-8
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// No parser for the declared or detected format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Structured document is not JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParseError {
    pub fn schema(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            record: record.into(),
            message: message.into(),
        }
    }

    pub fn record(line: usize, message: impl Into<String>) -> Self {
        Self::Record {
            line,
            message: message.into(),
        }
    }

    /// Whether the error concerns one record rather than the whole document
    pub fn is_record_level(&self) -> bool {
        matches!(self, ParseError::Schema { .. } | ParseError::Record { .. })
    }
}

/// Convert a byte position to (line, column), 1-indexed.
pub(crate) fn line_col(input: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, c) in input.char_indices() {
        if i >= position {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let input = "ab\ncd\nef";
        assert_eq!(line_col(input, 0), (1, 1));
        assert_eq!(line_col(input, 4), (2, 2));
        assert_eq!(line_col(input, 6), (3, 1));
    }

    #[test]
    fn test_record_level_classification() {
        assert!(ParseError::record(3, "missing id").is_record_level());
        assert!(ParseError::schema("node[0]", "missing lbl").is_record_level());
        assert!(!ParseError::Encoding("bad".into()).is_record_level());
    }
}
