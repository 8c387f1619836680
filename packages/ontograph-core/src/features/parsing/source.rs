//! Source format selection
//!
//! ```text
//! (bytes, hint) ──► SourceFormat::detect ──► OntologySource ──► ParseOutput
//!                      │ hint: ext / content type
//!                      └ fallback: content sniffing
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ParseError;
use super::flat_text::FlatTextParser;
use super::structured::StructuredParser;
use super::triple::TripleParser;
use crate::shared::{RawNode, SubsetTable};

/// Closed set of supported source families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Turtle / N-Triples
    Triple,
    /// OBO stanzas
    FlatText,
    /// JSON graph-node exports
    Structured,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Triple => "triple",
            SourceFormat::FlatText => "flat_text",
            SourceFormat::Structured => "structured",
        }
    }

    /// Map a file extension or content type to a format.
    ///
    /// Returns `Err(UnsupportedFormat)` for recognised but unsupported
    /// serializations (RDF/XML, JSON-LD) and `Ok(None)` for unknown hints.
    pub fn from_hint(hint: &str) -> Result<Option<Self>, ParseError> {
        let hint = hint.trim().trim_start_matches('.').to_ascii_lowercase();
        let hint = hint.split(';').next().unwrap_or("").trim();
        let format = match hint {
            "ttl" | "turtle" | "text/turtle" | "nt" | "ntriples" | "n-triples"
            | "application/n-triples" => Some(SourceFormat::Triple),
            "obo" | "text/obo" | "application/obo" => Some(SourceFormat::FlatText),
            "json" | "application/json" | "text/json" => Some(SourceFormat::Structured),
            "rdf" | "owl" | "xml" | "rdf/xml" | "application/rdf+xml" | "jsonld"
            | "application/ld+json" => {
                return Err(ParseError::UnsupportedFormat(hint.to_string()));
            }
            _ => None,
        };
        Ok(format)
    }

    /// Guess a format from the document itself
    pub fn sniff(text: &str) -> Option<Self> {
        let body = text.trim_start_matches('\u{feff}');
        let first = body
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('!'))?;

        let stanza_header = first.starts_with("[Term]") || first.starts_with("[Typedef]");
        if first.starts_with('{') || (first.starts_with('[') && !stanza_header) {
            return Some(SourceFormat::Structured);
        }
        if first.starts_with("format-version:") || body.lines().any(|l| l.trim() == "[Term]") {
            return Some(SourceFormat::FlatText);
        }
        if first.starts_with("@prefix")
            || first.starts_with("@base")
            || first.starts_with("PREFIX")
            || first.starts_with("BASE")
            || first.starts_with('<')
            || first.starts_with("_:")
        {
            return Some(SourceFormat::Triple);
        }
        None
    }

    /// Hint first, then content sniffing
    pub fn detect(hint: Option<&str>, text: &str) -> Result<Self, ParseError> {
        if let Some(hint) = hint {
            if let Some(format) = Self::from_hint(hint)? {
                return Ok(format);
            }
            debug!(hint, "format hint not recognised, sniffing content");
        }
        Self::sniff(text).ok_or_else(|| {
            ParseError::UnsupportedFormat(format!(
                "cannot determine format (hint: {})",
                hint.unwrap_or("none")
            ))
        })
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs shared by every parser
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Prefix applied to `notation` values of triple sources
    pub source_tag: String,
    pub subsets: Arc<SubsetTable>,
}

impl ParseContext {
    pub fn new(source_tag: impl Into<String>, subsets: Arc<SubsetTable>) -> Self {
        Self {
            source_tag: source_tag.into(),
            subsets,
        }
    }
}

/// Parsed records plus the per-record errors that did not stop the batch
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub nodes: Vec<RawNode>,
    pub errors: Vec<ParseError>,
}

/// One source family
pub trait SourceParser {
    fn format(&self) -> SourceFormat;

    fn parse(&self, text: &str) -> Result<ParseOutput, ParseError>;
}

/// Tagged parser variants behind one interface
#[derive(Debug, Clone)]
pub enum OntologySource {
    Triple(TripleParser),
    FlatText(FlatTextParser),
    Structured(StructuredParser),
}

impl OntologySource {
    pub fn for_format(format: SourceFormat, ctx: &ParseContext) -> Self {
        match format {
            SourceFormat::Triple => OntologySource::Triple(TripleParser::new(ctx.clone())),
            SourceFormat::FlatText => OntologySource::FlatText(FlatTextParser::new(ctx.clone())),
            SourceFormat::Structured => {
                OntologySource::Structured(StructuredParser::new(ctx.clone()))
            }
        }
    }
}

impl SourceParser for OntologySource {
    fn format(&self) -> SourceFormat {
        match self {
            OntologySource::Triple(p) => p.format(),
            OntologySource::FlatText(p) => p.format(),
            OntologySource::Structured(p) => p.format(),
        }
    }

    fn parse(&self, text: &str) -> Result<ParseOutput, ParseError> {
        match self {
            OntologySource::Triple(p) => p.parse(text),
            OntologySource::FlatText(p) => p.parse(text),
            OntologySource::Structured(p) => p.parse(text),
        }
    }
}

/// `(bytes, format_hint) -> ParseOutput`
pub fn parse_bytes(
    bytes: &[u8],
    format_hint: Option<&str>,
    ctx: &ParseContext,
) -> Result<(SourceFormat, ParseOutput), ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ParseError::Encoding(e.to_string()))?;
    let format = SourceFormat::detect(format_hint, text)?;
    let output = OntologySource::for_format(format, ctx).parse(text)?;
    debug!(
        format = %format,
        nodes = output.nodes.len(),
        record_errors = output.errors.len(),
        "parsed source"
    );
    Ok((format, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_mapping() {
        assert_eq!(SourceFormat::from_hint("ttl").unwrap(), Some(SourceFormat::Triple));
        assert_eq!(SourceFormat::from_hint(".OBO").unwrap(), Some(SourceFormat::FlatText));
        assert_eq!(
            SourceFormat::from_hint("application/json; charset=utf-8").unwrap(),
            Some(SourceFormat::Structured)
        );
        assert_eq!(SourceFormat::from_hint("csv").unwrap(), None);
    }

    #[test]
    fn test_rdf_xml_unsupported() {
        assert!(matches!(
            SourceFormat::from_hint("application/rdf+xml"),
            Err(ParseError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_sniffing() {
        assert_eq!(
            SourceFormat::sniff("@prefix ex: <http://example.org/> ."),
            Some(SourceFormat::Triple)
        );
        assert_eq!(
            SourceFormat::sniff("format-version: 1.2\n\n[Term]\nid: DOID:4"),
            Some(SourceFormat::FlatText)
        );
        assert_eq!(SourceFormat::sniff("[Term]\nid: DOID:4"), Some(SourceFormat::FlatText));
        assert_eq!(SourceFormat::sniff("  {\"id\": \"x\"}"), Some(SourceFormat::Structured));
        assert_eq!(SourceFormat::sniff("[{\"id\": \"x\"}]"), Some(SourceFormat::Structured));
        assert_eq!(SourceFormat::sniff("hello"), None);
    }

    #[test]
    fn test_unknown_hint_falls_back_to_sniffing() {
        let format = SourceFormat::detect(Some("upload.bin"), "<http://a> <http://b> \"c\" .").unwrap();
        assert_eq!(format, SourceFormat::Triple);
    }

    #[test]
    fn test_invalid_utf8_is_encoding_error() {
        let ctx = ParseContext::new("TEST", Arc::new(SubsetTable::default()));
        let err = parse_bytes(&[0xff, 0xfe, 0x00], Some("ttl"), &ctx).unwrap_err();
        assert!(matches!(err, ParseError::Encoding(_)));
    }
}
