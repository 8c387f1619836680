//! Character classes for names and IRIs

/// First character of a prefix (`PN_CHARS_BASE`)
pub fn is_name_base(c: char) -> bool {
    c.is_ascii_alphabetic() || (!c.is_ascii() && c.is_alphabetic())
}

/// `PN_CHARS_U`
pub fn is_name_start(c: char) -> bool {
    is_name_base(c) || c == '_'
}

/// `PN_CHARS`
pub fn is_name_char(c: char) -> bool {
    is_name_start(c)
        || c == '-'
        || c.is_ascii_digit()
        || c == '\u{00B7}'
        || matches!(c, '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
}

/// Characters allowed inside a local name, besides escapes
pub fn is_local_char(c: char) -> bool {
    is_name_char(c) || c == ':' || c == '%'
}

/// Characters that may follow `\` in a local name
pub fn is_local_escape(c: char) -> bool {
    "_~.-!$&'()*+,;=/?#@%".contains(c)
}

pub fn is_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Unescaped IRI character
pub fn is_iri_char(c: char) -> bool {
    !matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | '\x00'..='\x20')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_classes() {
        assert!(is_name_base('é'));
        assert!(!is_name_base('_'));
        assert!(is_name_start('_'));
        assert!(is_name_char('7'));
        assert!(!is_name_char(':'));
        assert!(is_local_char(':'));
    }

    #[test]
    fn test_iri_chars() {
        assert!(is_iri_char('#'));
        assert!(!is_iri_char(' '));
        assert!(!is_iri_char('>'));
    }
}
