//! Argument trees built from lexer tokens.

use super::lexer::{Lexer, Token};
use crate::{Error, Result};

/// Deepest parenthesis nesting accepted in one command.
pub const MAX_DEPTH: usize = 64;

/// One syntactic argument of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// Bare atom.
    Atom(String),
    /// Quoted string, unescaped.
    Quoted(String),
    /// Literal bytes, exactly as declared.
    Literal(Vec<u8>),
    /// Parenthesized list; `()` is an empty list, not an absent one.
    List(Vec<Item>),
}

impl Item {
    /// Returns the value of an atom, quoted string or UTF-8 literal.
    #[must_use]
    pub fn as_astring(&self) -> Option<String> {
        match self {
            Self::Atom(s) | Self::Quoted(s) => Some(s.clone()),
            Self::Literal(bytes) => String::from_utf8(bytes.clone()).ok(),
            Self::List(_) => None,
        }
    }

    /// Returns the atom text, if this is an atom.
    #[must_use]
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list members, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Splits command arguments into items, recursing into parentheses.
///
/// Fails on unbalanced parentheses, on nesting deeper than [`MAX_DEPTH`]
/// and on any lexer error.
pub fn scan(input: &[u8]) -> Result<Vec<Item>> {
    let mut lexer = Lexer::new(input);
    let mut stack: Vec<Vec<Item>> = vec![Vec::new()];

    loop {
        let token = lexer.next_token()?;
        let item = match token {
            Token::Space => continue,
            Token::Eof | Token::Crlf => break,
            Token::LParen => {
                if stack.len() > MAX_DEPTH {
                    return Err(syntax(&lexer, "Parentheses nested too deeply"));
                }
                stack.push(Vec::new());
                continue;
            }
            Token::RParen => {
                if stack.len() < 2 {
                    return Err(syntax(&lexer, "Unexpected )"));
                }
                Item::List(stack.pop().unwrap_or_default())
            }
            Token::Atom(s) => Item::Atom(s.to_string()),
            Token::QuotedString(s) => Item::Quoted(s),
            Token::Literal(bytes) => Item::Literal(bytes.to_vec()),
        };
        if let Some(top) = stack.last_mut() {
            top.push(item);
        }
    }

    if !lexer.is_eof() {
        return Err(syntax(&lexer, "Unexpected data after CRLF"));
    }
    if stack.len() != 1 {
        return Err(syntax(&lexer, "Unbalanced parentheses"));
    }
    Ok(stack.pop().unwrap_or_default())
}

fn syntax(lexer: &Lexer<'_>, message: &str) -> Error {
    Error::Syntax {
        position: lexer.position(),
        message: message.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn atom(s: &str) -> Item {
        Item::Atom(s.to_string())
    }

    #[test]
    fn flat_arguments() {
        assert_eq!(
            scan(b"INBOX \"My Folder\"").unwrap(),
            vec![atom("INBOX"), Item::Quoted("My Folder".into())]
        );
    }

    #[test]
    fn nested_lists() {
        assert_eq!(
            scan(b"(a (b c) ())").unwrap(),
            vec![Item::List(vec![
                atom("a"),
                Item::List(vec![atom("b"), atom("c")]),
                Item::List(vec![]),
            ])]
        );
    }

    #[test]
    fn empty_list_is_distinct_from_nothing() {
        assert_eq!(scan(b"()").unwrap(), vec![Item::List(vec![])]);
        assert!(scan(b"").unwrap().is_empty());
    }

    #[test]
    fn literal_inside_line() {
        assert_eq!(
            scan(b"Drafts {3}\r\nabc").unwrap(),
            vec![atom("Drafts"), Item::Literal(b"abc".to_vec())]
        );
    }

    #[test]
    fn unbalanced_parentheses_fail() {
        assert!(scan(b"(a b").is_err());
        assert!(scan(b"a)").is_err());
        assert!(scan(b"((a)").is_err());
    }

    #[test]
    fn nesting_is_capped() {
        let fits = format!("{}{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(scan(fits.as_bytes()).is_ok());

        let deep = format!("{}{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(scan(deep.as_bytes()).is_err());

        let huge = format!("{}{}", "(".repeat(300_000), ")".repeat(300_000));
        assert!(scan(huge.as_bytes()).is_err());
    }

    #[test]
    fn astring_accessors() {
        assert_eq!(atom("x").as_astring().as_deref(), Some("x"));
        assert_eq!(Item::Literal(vec![0xff]).as_astring(), None);
        assert_eq!(Item::List(vec![]).as_astring(), None);
        assert_eq!(Item::Quoted(String::new()).as_atom(), None);
    }
}
