//! S-expression reader
//!
//! Parses a whole input string into a single root [`Sexp`]. Atoms are either
//! basic (unquoted, no embedded whitespace) or quoted (double-quoted,
//! whitespace/punctuation preserved). Lists are parenthesized, may be empty,
//! and may nest arbitrarily. This module owns the only raw text ranges in
//! the crate — everything downstream reads `Sexp::Atom::text` as an
//! immutable view.

use crate::error::{CompileError, CompileResult};

/// Whether an atom's source text was quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AtomKind {
    /// Unquoted identifier, numeric, or symbol; no embedded whitespace.
    Basic,
    /// Double-quoted string; whitespace and punctuation preserved verbatim.
    Quoted,
}

/// A parsed s-expression node: an atom leaf or a proper list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Sexp {
    /// A leaf value.
    Atom {
        /// Whether the source text was quoted.
        kind: AtomKind,
        /// The atom's text, with surrounding quotes (if any) stripped.
        text: String,
    },
    /// A parenthesized, possibly-empty, possibly-nested list.
    List(Vec<Sexp>),
}

impl Sexp {
    /// Build a basic atom.
    #[must_use]
    pub fn basic(text: impl Into<String>) -> Self {
        Self::Atom {
            kind: AtomKind::Basic,
            text: text.into(),
        }
    }

    /// Build a quoted atom.
    #[must_use]
    pub fn quoted(text: impl Into<String>) -> Self {
        Self::Atom {
            kind: AtomKind::Quoted,
            text: text.into(),
        }
    }

    /// Returns the atom text, if this node is an atom.
    #[must_use]
    pub fn atom_text(&self) -> Option<&str> {
        match self {
            Self::Atom { text, .. } => Some(text.as_str()),
            Self::List(_) => None,
        }
    }

    /// Returns `true` if this is a basic atom whose text is exactly `s`.
    #[must_use]
    pub fn is_basic_atom(&self, s: &str) -> bool {
        matches!(self, Self::Atom { kind: AtomKind::Basic, text } if text == s)
    }

    /// Returns the list elements, if this node is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Sexp]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            Self::Atom { .. } => None,
        }
    }
}

/// Parse a complete input string into a single root [`Sexp`].
///
/// # Errors
/// Returns [`CompileError::BadQuerySyntax`] on unbalanced parentheses,
/// an unterminated quoted string, or trailing garbage after the root value.
pub fn parse(text: &str) -> CompileResult<Sexp> {
    let mut reader = Reader::new(text);
    reader.skip_whitespace();
    if reader.is_at_end() {
        return Err(CompileError::bad_syntax("empty s-expression"));
    }
    let root = reader.read_value()?;
    reader.skip_whitespace();
    if !reader.is_at_end() {
        return Err(CompileError::bad_syntax(
            "trailing characters after s-expression",
        ));
    }
    Ok(root)
}

struct Reader<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn read_value(&mut self) -> CompileResult<Sexp> {
        match self.chars.peek() {
            Some('(') => self.read_list(),
            Some('"') => self.read_quoted_atom(),
            Some(_) => self.read_basic_atom(),
            None => Err(CompileError::bad_syntax("unexpected end of input")),
        }
    }

    fn read_list(&mut self) -> CompileResult<Sexp> {
        self.chars.next(); // consume '('
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                None => return Err(CompileError::bad_syntax("unterminated list")),
                Some(')') => {
                    self.chars.next();
                    return Ok(Sexp::List(items));
                }
                Some(_) => items.push(self.read_value()?),
            }
        }
    }

    fn read_quoted_atom(&mut self) -> CompileResult<Sexp> {
        self.chars.next(); // consume opening quote
        let mut text = String::new();
        loop {
            match self.chars.next() {
                None => return Err(CompileError::bad_syntax("unterminated quoted atom")),
                Some('"') => return Ok(Sexp::quoted(text)),
                Some('\\') => match self.chars.next() {
                    Some(c) => text.push(c),
                    None => return Err(CompileError::bad_syntax("unterminated quoted atom")),
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn read_basic_atom(&mut self) -> CompileResult<Sexp> {
        let mut text = String::new();
        loop {
            match self.chars.peek() {
                None => break,
                Some(c) if c.is_whitespace() || *c == '(' || *c == ')' => break,
                Some(_) => text.push(self.chars.next().expect("peeked")),
            }
        }
        if text.is_empty() {
            return Err(CompileError::bad_syntax("empty atom"));
        }
        Ok(Sexp::basic(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_empty_list() {
        assert_eq!(parse("()").unwrap(), Sexp::List(vec![]));
    }

    #[test]
    fn parses_basic_atom_list() {
        let root = parse("(and foo bar)").unwrap();
        assert_eq!(
            root,
            Sexp::List(vec![Sexp::basic("and"), Sexp::basic("foo"), Sexp::basic("bar")])
        );
    }

    #[test]
    fn parses_quoted_atom() {
        let root = parse(r#"(from "Alice Smith")"#).unwrap();
        assert_eq!(
            root,
            Sexp::List(vec![Sexp::basic("from"), Sexp::quoted("Alice Smith")])
        );
    }

    #[test]
    fn parses_nested_lists() {
        let root = parse("(and (or a b) c)").unwrap();
        assert_eq!(
            root,
            Sexp::List(vec![
                Sexp::basic("and"),
                Sexp::List(vec![Sexp::basic("or"), Sexp::basic("a"), Sexp::basic("b")]),
                Sexp::basic("c"),
            ])
        );
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert!(parse("(and foo").is_err());
        assert!(parse("and foo)").is_err());
    }

    #[test]
    fn rejects_unterminated_quote() {
        assert!(parse(r#"(from "alice)"#).is_err());
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("() ()").is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
    }

    #[test]
    fn quoted_atom_preserves_whitespace() {
        let root = parse(r#""a  b""#).unwrap();
        assert_eq!(root.atom_text(), Some("a  b"));
    }

    #[test]
    fn is_basic_atom_matches_only_basic() {
        assert!(Sexp::basic("*").is_basic_atom("*"));
        assert!(!Sexp::quoted("*").is_basic_atom("*"));
    }

    #[test]
    fn quoted_atom_supports_escapes() {
        let root = parse(r#""a\"b""#).unwrap();
        assert_eq!(root.atom_text(), Some("a\"b"));
    }
}
