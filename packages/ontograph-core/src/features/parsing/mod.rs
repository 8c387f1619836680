//! Format parsers: bytes → `RawNode`s
//!
//! Three source families share one vocabulary (`SynonymScope`, subset
//! entries, `is_a` parents):
//!
//! - `triple`: Turtle / N-Triples
//! - `flat_text`: OBO stanzas
//! - `structured`: JSON graph-node exports

pub mod error;
pub mod flat_text;
pub mod source;
pub mod structured;
pub mod triple;

pub use error::ParseError;
pub use flat_text::FlatTextParser;
pub use source::{parse_bytes, OntologySource, ParseContext, ParseOutput, SourceFormat, SourceParser};
pub use structured::StructuredParser;
pub use triple::TripleParser;
