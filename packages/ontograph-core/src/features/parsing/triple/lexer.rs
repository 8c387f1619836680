//! Triple document lexer (winnow)
//!
//! Turns Turtle / N-Triples text into a flat token vector. Stops at the
//! first invalid token and reports its line and column.

use winnow::ascii::{digit0, digit1};
use winnow::combinator::{alt, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::stream::{AsChar, Location};
use winnow::token::{any, one_of, take, take_till, take_while};
use winnow::{LocatingSlice, ModalResult, Parser};

use super::chars::*;
use super::token::{Token, TokenKind};
use crate::features::parsing::error::{line_col, ParseError};

/// Lexer input, tracks byte offsets for spans
pub type Input<'a> = LocatingSlice<&'a str>;

/// Tokenize a whole document; the last token is always `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut input = LocatingSlice::new(source);
    let mut tokens = Vec::new();

    loop {
        skip_trivia(&mut input);

        let start = input.current_token_start();
        if input.is_empty() {
            tokens.push(Token::new(TokenKind::Eof, start, start));
            break;
        }

        match next_token(&mut input) {
            Ok(kind) => {
                let end = input.current_token_start();
                tokens.push(Token::new(kind, start, end));
            }
            Err(_) => return Err(lex_error(source, start)),
        }
    }

    Ok(tokens)
}

fn lex_error(source: &str, position: usize) -> ParseError {
    let (line, column) = line_col(source, position);
    let found = source
        .get(position..)
        .and_then(|rest| rest.chars().next())
        .unwrap_or('?');
    let message = match found {
        '"' | '\'' => "unterminated or invalid string literal".to_string(),
        '<' => "invalid or unterminated IRI".to_string(),
        c => format!("unexpected character '{}'", c.escape_default()),
    };
    ParseError::Lexer {
        line,
        column,
        message,
    }
}

fn backtrack() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::new())
}

/// Whitespace and `#` comments
fn skip_trivia(input: &mut Input<'_>) {
    loop {
        let _: ModalResult<&str, ContextError> = take_while(0.., is_ws).parse_next(input);
        if !input.starts_with('#') {
            break;
        }
        let _: ModalResult<&str, ContextError> =
            take_till(0.., |c| c == '\n' || c == '\r').parse_next(input);
    }
}

fn next_token(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        double_caret,
        iri,
        blank_node,
        anon,
        string_literal,
        at_word,
        number,
        name_or_keyword,
        punctuation,
    ))
    .parse_next(input)
}

fn double_caret(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    "^^".value(TokenKind::DoubleCaret).parse_next(input)
}

fn anon(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    ('[', take_while(0.., is_ws), ']')
        .value(TokenKind::Anon)
        .parse_next(input)
}

fn punctuation(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let c: char = one_of(['.', ';', ',', '[', ']', '(', ')']).parse_next(input)?;
    Ok(match c {
        '.' => TokenKind::Dot,
        ';' => TokenKind::Semicolon,
        ',' => TokenKind::Comma,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        '(' => TokenKind::LParen,
        _ => TokenKind::RParen,
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// IRIs and names
// ═══════════════════════════════════════════════════════════════════════════

fn iri(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    '<'.parse_next(input)?;
    let mut out = String::new();

    loop {
        let chunk: &str = take_while(0.., is_iri_char).parse_next(input)?;
        out.push_str(chunk);

        if input.starts_with('>') {
            break;
        }
        if input.starts_with("\\u") || input.starts_with("\\U") {
            '\\'.parse_next(input)?;
            out.push(unicode_escape(input)?);
            continue;
        }
        return Err(backtrack());
    }

    '>'.parse_next(input)?;
    Ok(TokenKind::Iri(out))
}

/// `\uXXXX` / `\UXXXXXXXX`, backslash already consumed
fn unicode_escape(input: &mut Input<'_>) -> ModalResult<char> {
    let marker: char = one_of(['u', 'U']).parse_next(input)?;
    let width: usize = if marker == 'u' { 4 } else { 8 };
    let digits: &str = take_while(width, AsChar::is_hex_digit).parse_next(input)?;
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(backtrack)
}

/// Run of `allowed` chars; a `.` is kept only when another allowed char follows.
fn dotted_run(input: &mut Input<'_>, allowed: fn(char) -> bool) -> ModalResult<String> {
    let mut out = String::new();
    loop {
        let chunk: &str = take_while(0.., allowed).parse_next(input)?;
        out.push_str(chunk);

        let mut ahead = input.chars();
        if ahead.next() == Some('.') && ahead.next().is_some_and(allowed) {
            '.'.parse_next(input)?;
            out.push('.');
            continue;
        }
        return Ok(out);
    }
}

fn local_name(input: &mut Input<'_>) -> ModalResult<String> {
    let mut out = String::new();
    loop {
        out.push_str(&dotted_run(input, is_local_char)?);
        if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            let escaped: char = one_of(is_local_escape).parse_next(input)?;
            out.push(escaped);
            continue;
        }
        break;
    }
    if out.is_empty() {
        return Err(backtrack());
    }
    Ok(out)
}

/// `prefix:local`, `:local`, `prefix:` or a bare keyword
fn name_or_keyword(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let prefix = match input.chars().next() {
        Some(c) if is_name_base(c) => dotted_run(input, is_name_char)?,
        _ => String::new(),
    };

    if opt(':').parse_next(input)?.is_some() {
        let starts_local = input.chars().next().is_some_and(|c| {
            is_name_start(c) || c.is_ascii_digit() || matches!(c, ':' | '%' | '\\')
        });
        let local = if starts_local {
            local_name(input)?
        } else {
            String::new()
        };
        return Ok(TokenKind::PrefixedName { prefix, local });
    }

    match prefix.as_str() {
        "a" => Ok(TokenKind::KwA),
        "true" => Ok(TokenKind::KwTrue),
        "false" => Ok(TokenKind::KwFalse),
        word if word.eq_ignore_ascii_case("prefix") => Ok(TokenKind::KwSparqlPrefix),
        word if word.eq_ignore_ascii_case("base") => Ok(TokenKind::KwSparqlBase),
        _ => Err(backtrack()),
    }
}

fn blank_node(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let _: &str = "_:".parse_next(input)?;
    let starts_label = input
        .chars()
        .next()
        .is_some_and(|c| is_name_start(c) || c.is_ascii_digit());
    if !starts_label {
        return Err(backtrack());
    }
    Ok(TokenKind::BlankNode(dotted_run(input, is_name_char)?))
}

/// `@prefix`, `@base` or a language tag
fn at_word(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    '@'.parse_next(input)?;
    let word: &str =
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-').parse_next(input)?;
    Ok(match word {
        "prefix" => TokenKind::KwPrefix,
        "base" => TokenKind::KwBase,
        tag => TokenKind::LangTag(tag.to_string()),
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Literals
// ═══════════════════════════════════════════════════════════════════════════

fn number(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let lexeme: &str = (
        opt(one_of(['+', '-'])),
        digit0,
        opt(('.', digit1)),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .parse_next(input)?;

    let mantissa = lexeme.trim_start_matches(['+', '-']);
    if !mantissa.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Err(backtrack());
    }
    Ok(TokenKind::Number(lexeme.to_string()))
}

fn string_literal(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let (quote, long) = if input.starts_with("\"\"\"") {
        ('"', true)
    } else if input.starts_with("'''") {
        ('\'', true)
    } else if input.starts_with('"') {
        ('"', false)
    } else if input.starts_with('\'') {
        ('\'', false)
    } else {
        return Err(backtrack());
    };
    let delimiter = if long { 3usize } else { 1 };

    let _: &str = take(delimiter).parse_next(input)?;
    let body = string_body(input, quote, long)?;
    let _: &str = take(delimiter).parse_next(input)?;
    Ok(TokenKind::String(body))
}

/// Body up to (not including) the closing delimiter
fn string_body(input: &mut Input<'_>, quote: char, long: bool) -> ModalResult<String> {
    let closing: String = std::iter::repeat(quote).take(3).collect();
    let mut out = String::new();

    loop {
        let chunk: &str = take_while(0.., |c: char| {
            c != quote && c != '\\' && (long || (c != '\n' && c != '\r'))
        })
        .parse_next(input)?;
        out.push_str(chunk);

        if input.is_empty() {
            return Err(backtrack());
        }
        if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            out.push(escape(input)?);
            continue;
        }
        if !input.starts_with(quote) {
            // line break inside a short string
            return Err(backtrack());
        }
        if !long {
            return Ok(out);
        }
        // a quote run longer than the delimiter ends with the delimiter
        let run = input.chars().take_while(|c| *c == quote).count();
        if input.starts_with(closing.as_str()) && run == 3 {
            return Ok(out);
        }
        let c: char = any.parse_next(input)?;
        out.push(c);
    }
}

fn escape(input: &mut Input<'_>) -> ModalResult<char> {
    let c: char = any.parse_next(input)?;
    match c {
        't' => Ok('\t'),
        'b' => Ok('\u{0008}'),
        'n' => Ok('\n'),
        'r' => Ok('\r'),
        'f' => Ok('\u{000C}'),
        '"' | '\'' | '\\' => Ok(c),
        'u' | 'U' => {
            let width: usize = if c == 'u' { 4 } else { 8 };
            let digits: &str = take_while(width, AsChar::is_hex_digit).parse_next(input)?;
            u32::from_str_radix(digits, 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(backtrack)
        }
        _ => Err(backtrack()),
    }
}
