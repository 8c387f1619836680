//! Tokens produced by the triple lexer

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `<...>` with escapes resolved, not yet made absolute
    Iri(String),
    /// `prefix:local`; `local` is empty for a bare namespace (`ex:`)
    PrefixedName { prefix: String, local: String },
    /// `_:label`
    BlankNode(String),
    /// `[]`
    Anon,
    /// String literal with escapes resolved
    String(String),
    /// `@en`, `@en-GB`
    LangTag(String),
    /// Integer, decimal or double, lexical form
    Number(String),

    KwA,
    KwTrue,
    KwFalse,
    /// `@prefix`
    KwPrefix,
    /// `@base`
    KwBase,
    /// `PREFIX`
    KwSparqlPrefix,
    /// `BASE`
    KwSparqlBase,

    DoubleCaret,
    Dot,
    Semicolon,
    Comma,
    LBracket,
    RBracket,
    LParen,
    RParen,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Iri(iri) => write!(f, "<{}>", iri),
            TokenKind::PrefixedName { prefix, local } => write!(f, "{}:{}", prefix, local),
            TokenKind::BlankNode(label) => write!(f, "_:{}", label),
            TokenKind::Anon => f.write_str("[]"),
            TokenKind::String(_) => f.write_str("string literal"),
            TokenKind::LangTag(tag) => write!(f, "@{}", tag),
            TokenKind::Number(n) => f.write_str(n),
            TokenKind::KwA => f.write_str("'a'"),
            TokenKind::KwTrue => f.write_str("true"),
            TokenKind::KwFalse => f.write_str("false"),
            TokenKind::KwPrefix => f.write_str("@prefix"),
            TokenKind::KwBase => f.write_str("@base"),
            TokenKind::KwSparqlPrefix => f.write_str("PREFIX"),
            TokenKind::KwSparqlBase => f.write_str("BASE"),
            TokenKind::DoubleCaret => f.write_str("'^^'"),
            TokenKind::Dot => f.write_str("'.'"),
            TokenKind::Semicolon => f.write_str("';'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::LBracket => f.write_str("'['"),
            TokenKind::RBracket => f.write_str("']'"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// Token with its byte span in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }
}
