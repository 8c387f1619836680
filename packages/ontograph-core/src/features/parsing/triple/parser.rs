//! Token stream → triples
//!
//! Recursive descent over the Turtle grammar. Blank nodes get
//! document-local labels; collections expand to `rdf:first`/`rdf:rest`
//! chains.

use std::collections::HashMap;

use super::lexer::tokenize;
use super::token::{Token, TokenKind};
use crate::features::parsing::error::{line_col, ParseError};
use crate::shared::vocab::{RDF_FIRST, RDF_NIL, RDF_REST, RDF_TYPE, XSD_BOOLEAN};

const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

/// RDF term
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal {
        lexical: String,
        language: Option<String>,
        datatype: Option<String>,
    },
}

impl Term {
    fn literal(lexical: impl Into<String>) -> Self {
        Term::Literal {
            lexical: lexical.into(),
            language: None,
            datatype: None,
        }
    }

    fn typed(lexical: impl Into<String>, datatype: &str) -> Self {
        Term::Literal {
            lexical: lexical.into(),
            language: None,
            datatype: Some(datatype.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

/// Parse a Turtle or N-Triples document into triples, in document order.
pub fn parse_document(source: &str) -> Result<Vec<Triple>, ParseError> {
    TripleReader::new(source)?.read()
}

struct TripleReader<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    prefixes: HashMap<String, String>,
    base: Option<String>,
    next_blank: usize,
    triples: Vec<Triple>,
}

impl<'a> TripleReader<'a> {
    fn new(source: &'a str) -> Result<Self, ParseError> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
            prefixes: HashMap::new(),
            base: None,
            next_blank: 0,
            triples: Vec::new(),
        })
    }

    fn read(mut self) -> Result<Vec<Triple>, ParseError> {
        while !self.at_end() {
            self.statement()?;
        }
        Ok(self.triples)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Cursor
    // ═══════════════════════════════════════════════════════════════════════

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("expected {}", kind)))
        }
    }

    fn syntax_error(&self, position: usize, message: impl Into<String>) -> ParseError {
        let (line, column) = line_col(self.source, position);
        ParseError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    fn unexpected(&self, context: &str) -> ParseError {
        let token = self.current();
        self.syntax_error(token.start, format!("{}, found {}", context, token.kind))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Directives
    // ═══════════════════════════════════════════════════════════════════════

    fn statement(&mut self) -> Result<(), ParseError> {
        match self.current().kind {
            TokenKind::KwPrefix | TokenKind::KwSparqlPrefix => self.prefix_directive(),
            TokenKind::KwBase | TokenKind::KwSparqlBase => self.base_directive(),
            _ => {
                self.triples_block()?;
                self.expect(&TokenKind::Dot)?;
                Ok(())
            }
        }
    }

    fn prefix_directive(&mut self) -> Result<(), ParseError> {
        let turtle_style = matches!(self.advance().kind, TokenKind::KwPrefix);

        let prefix = match &self.current().kind {
            TokenKind::PrefixedName { prefix, local } if local.is_empty() => prefix.clone(),
            _ => return Err(self.unexpected("expected prefix name ending in ':'")),
        };
        self.advance();

        let namespace = match &self.current().kind {
            TokenKind::Iri(iri) => self.resolve(iri),
            _ => return Err(self.unexpected("expected namespace IRI")),
        };
        self.advance();
        self.prefixes.insert(prefix, namespace);

        if turtle_style {
            self.expect(&TokenKind::Dot)?;
        }
        Ok(())
    }

    fn base_directive(&mut self) -> Result<(), ParseError> {
        let turtle_style = matches!(self.advance().kind, TokenKind::KwBase);

        let base = match &self.current().kind {
            TokenKind::Iri(iri) => self.resolve(iri),
            _ => return Err(self.unexpected("expected base IRI")),
        };
        self.advance();
        self.base = Some(base);

        if turtle_style {
            self.expect(&TokenKind::Dot)?;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Triples
    // ═══════════════════════════════════════════════════════════════════════

    fn triples_block(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenKind::LBracket) {
            // `[ :p :o ] :q :r .` with an optional trailing predicate list
            let subject = self.blank_property_list()?;
            if !self.check(&TokenKind::Dot) {
                self.predicate_object_list(&subject)?;
            }
            return Ok(());
        }

        let subject = self.subject()?;
        self.predicate_object_list(&subject)
    }

    fn subject(&mut self) -> Result<Term, ParseError> {
        match &self.current().kind {
            TokenKind::Iri(_) | TokenKind::PrefixedName { .. } => Ok(Term::Iri(self.iri()?)),
            TokenKind::BlankNode(label) => {
                let term = Term::Blank(label.clone());
                self.advance();
                Ok(term)
            }
            TokenKind::Anon => {
                self.advance();
                Ok(self.fresh_blank())
            }
            TokenKind::LParen => self.collection(),
            _ => Err(self.unexpected("expected subject")),
        }
    }

    fn predicate_object_list(&mut self, subject: &Term) -> Result<(), ParseError> {
        loop {
            let predicate = self.verb()?;
            self.object_list(subject, &predicate)?;

            if !self.eat(&TokenKind::Semicolon) {
                return Ok(());
            }
            // repeated or trailing ';'
            while self.eat(&TokenKind::Semicolon) {}
            if matches!(
                self.current().kind,
                TokenKind::Dot | TokenKind::RBracket | TokenKind::Eof
            ) {
                return Ok(());
            }
        }
    }

    fn verb(&mut self) -> Result<String, ParseError> {
        if self.eat(&TokenKind::KwA) {
            return Ok(RDF_TYPE.to_string());
        }
        match self.current().kind {
            TokenKind::Iri(_) | TokenKind::PrefixedName { .. } => self.iri(),
            _ => Err(self.unexpected("expected predicate")),
        }
    }

    fn object_list(&mut self, subject: &Term, predicate: &str) -> Result<(), ParseError> {
        loop {
            let object = self.object()?;
            self.emit(subject.clone(), predicate, object);
            if !self.eat(&TokenKind::Comma) {
                return Ok(());
            }
        }
    }

    fn object(&mut self) -> Result<Term, ParseError> {
        match &self.current().kind {
            TokenKind::Iri(_) | TokenKind::PrefixedName { .. } => Ok(Term::Iri(self.iri()?)),
            TokenKind::BlankNode(label) => {
                let term = Term::Blank(label.clone());
                self.advance();
                Ok(term)
            }
            TokenKind::Anon => {
                self.advance();
                Ok(self.fresh_blank())
            }
            TokenKind::LBracket => self.blank_property_list(),
            TokenKind::LParen => self.collection(),
            TokenKind::String(_) => self.string_literal(),
            TokenKind::Number(lexical) => {
                let datatype = if lexical.contains(['e', 'E']) {
                    XSD_DOUBLE
                } else if lexical.contains('.') {
                    XSD_DECIMAL
                } else {
                    XSD_INTEGER
                };
                let term = Term::typed(lexical.clone(), datatype);
                self.advance();
                Ok(term)
            }
            TokenKind::KwTrue => {
                self.advance();
                Ok(Term::typed("true", XSD_BOOLEAN))
            }
            TokenKind::KwFalse => {
                self.advance();
                Ok(Term::typed("false", XSD_BOOLEAN))
            }
            _ => Err(self.unexpected("expected object")),
        }
    }

    fn string_literal(&mut self) -> Result<Term, ParseError> {
        let lexical = match self.advance().kind {
            TokenKind::String(s) => s,
            _ => return Err(self.unexpected("expected string literal")),
        };

        if let TokenKind::LangTag(tag) = &self.current().kind {
            let language = Some(tag.clone());
            self.advance();
            return Ok(Term::Literal {
                lexical,
                language,
                datatype: None,
            });
        }
        if self.eat(&TokenKind::DoubleCaret) {
            let datatype = Some(self.iri()?);
            return Ok(Term::Literal {
                lexical,
                language: None,
                datatype,
            });
        }
        Ok(Term::literal(lexical))
    }

    /// `[ p o ; ... ]`
    fn blank_property_list(&mut self) -> Result<Term, ParseError> {
        self.expect(&TokenKind::LBracket)?;
        let node = self.fresh_blank();
        self.predicate_object_list(&node)?;
        self.expect(&TokenKind::RBracket)?;
        Ok(node)
    }

    /// `( a b c )`
    fn collection(&mut self) -> Result<Term, ParseError> {
        self.expect(&TokenKind::LParen)?;

        let mut items = Vec::new();
        while !self.check(&TokenKind::RParen) {
            if self.at_end() {
                return Err(self.unexpected("unterminated collection"));
            }
            items.push(self.object()?);
        }
        self.advance();

        if items.is_empty() {
            return Ok(Term::Iri(RDF_NIL.to_string()));
        }

        let cells: Vec<Term> = items.iter().map(|_| self.fresh_blank()).collect();
        for (i, item) in items.into_iter().enumerate() {
            self.emit(cells[i].clone(), RDF_FIRST, item);
            let rest = cells
                .get(i + 1)
                .cloned()
                .unwrap_or_else(|| Term::Iri(RDF_NIL.to_string()));
            self.emit(cells[i].clone(), RDF_REST, rest);
        }
        Ok(cells[0].clone())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // IRIs
    // ═══════════════════════════════════════════════════════════════════════

    /// Absolute IRI of the current `<...>` or prefixed-name token
    fn iri(&mut self) -> Result<String, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Iri(iri) => Ok(self.resolve(&iri)),
            TokenKind::PrefixedName { prefix, local } => match self.prefixes.get(&prefix) {
                Some(namespace) => Ok(format!("{}{}", namespace, local)),
                None => Err(ParseError::UndefinedPrefix {
                    prefix,
                    line: line_col(self.source, token.start).0,
                }),
            },
            other => Err(self.syntax_error(token.start, format!("expected IRI, found {}", other))),
        }
    }

    /// Relative references are appended to the base IRI.
    fn resolve(&self, iri: &str) -> String {
        match &self.base {
            Some(base) if !has_scheme(iri) => format!("{}{}", base, iri),
            _ => iri.to_string(),
        }
    }

    fn fresh_blank(&mut self) -> Term {
        self.next_blank += 1;
        Term::Blank(format!("genid{}", self.next_blank))
    }

    fn emit(&mut self, subject: Term, predicate: &str, object: Term) {
        self.triples.push(Triple {
            subject,
            predicate: predicate.to_string(),
            object,
        });
    }
}

fn has_scheme(iri: &str) -> bool {
    match iri.find(':') {
        Some(colon) => {
            let scheme = &iri[..colon];
            !scheme.is_empty()
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
