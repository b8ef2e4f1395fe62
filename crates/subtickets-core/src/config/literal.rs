//! Parser for the legacy list-literal option encoding.
//!
//! Existing installations configure the subticket options as list literals
//! such as `[['priority', ['low', 'middle', 'high']], 'summary']`. This
//! parser accepts that encoding unchanged so operator configuration can
//! migrate verbatim: single- or double-quoted strings, nested lists,
//! optional trailing commas, and backslash escapes inside strings.
//!
//! Parsing is strict and happens once at startup; anything outside the
//! grammar fails with a [`LiteralError`] instead of being deferred to
//! render time.

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

/// A parsed literal: a string or a nested list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListValue {
    /// A quoted string.
    Str(String),
    /// A bracketed list.
    List(Vec<ListValue>),
}

impl ListValue {
    /// Returns the string content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// Returns the list items, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[ListValue]> {
        match self {
            Self::Str(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

/// Errors from literal parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LiteralError {
    /// A character outside the grammar.
    #[error("unexpected character '{found}' at byte {pos}")]
    UnexpectedChar {
        /// Byte offset of the character.
        pos: usize,
        /// The offending character.
        found: char,
    },

    /// A string literal without a closing quote.
    #[error("unterminated string starting at byte {pos}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        pos: usize,
    },

    /// Input ended inside a list.
    #[error("unexpected end of input")]
    UnexpectedEnd,

    /// Content after the closing bracket of the outer list.
    #[error("trailing content at byte {pos}")]
    TrailingContent {
        /// Byte offset where the trailing content starts.
        pos: usize,
    },
}

/// Parses an encoded option into the items of its outer list.
///
/// # Errors
///
/// Returns a [`LiteralError`] describing the first spot where the input
/// leaves the grammar.
pub fn parse_list(input: &str) -> Result<Vec<ListValue>, LiteralError> {
    let mut parser = Parser::new(input);
    parser.skip_ws();
    let values = parser.list()?;
    parser.skip_ws();
    match parser.peek() {
        Some((pos, _)) => Err(LiteralError::TrailingContent { pos }),
        None => Ok(values),
    }
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
        }
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some((_, c)) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Consumes a bracketed list, opening bracket included.
    fn list(&mut self) -> Result<Vec<ListValue>, LiteralError> {
        match self.bump() {
            Some((_, '[')) => {}
            Some((pos, found)) => return Err(LiteralError::UnexpectedChar { pos, found }),
            None => return Err(LiteralError::UnexpectedEnd),
        }
        self.skip_ws();

        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => return Err(LiteralError::UnexpectedEnd),
                Some((_, ']')) => {
                    self.bump();
                    return Ok(items);
                }
                Some(_) => {
                    items.push(self.value()?);
                    self.skip_ws();
                    match self.peek() {
                        Some((_, ',')) => {
                            self.bump();
                            self.skip_ws();
                        }
                        Some((_, ']')) | None => {}
                        Some((pos, found)) => {
                            return Err(LiteralError::UnexpectedChar { pos, found });
                        }
                    }
                }
            }
        }
    }

    fn value(&mut self) -> Result<ListValue, LiteralError> {
        match self.peek() {
            Some((_, '[')) => Ok(ListValue::List(self.list()?)),
            Some((pos, quote @ ('\'' | '"'))) => {
                self.bump();
                Ok(ListValue::Str(self.string_body(pos, quote)?))
            }
            Some((pos, found)) => Err(LiteralError::UnexpectedChar { pos, found }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    /// Consumes a string body after its opening quote.
    fn string_body(&mut self, start: usize, quote: char) -> Result<String, LiteralError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(LiteralError::UnterminatedString { pos: start }),
                Some((_, c)) if c == quote => return Ok(out),
                Some((_, '\\')) => match self.bump() {
                    None => return Err(LiteralError::UnterminatedString { pos: start }),
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, escaped)) => out.push(escaped),
                },
                Some((_, c)) => out.push(c),
            }
        }
    }
}
