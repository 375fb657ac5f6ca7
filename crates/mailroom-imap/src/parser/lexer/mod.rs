//! IMAP lexer for tokenizing client commands.
//!
//! The lexer works on one complete command as assembled by the
//! [`CommandFramer`](super::CommandFramer), so every literal's bytes are
//! already present in the input.

#![allow(clippy::missing_errors_doc)]

mod token;

pub use token::Token;

use crate::{Error, Result};

/// IMAP lexer state.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the current position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Returns true if at end of input.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peeks at the current byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peeks at the byte at offset from current position.
    #[must_use]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Advances by one byte and returns it.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Skips n bytes.
    pub fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Reads the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        match byte {
            b'\r' => {
                if self.peek_at(1) == Some(b'\n') {
                    self.skip(2);
                    Ok(Token::Crlf)
                } else {
                    Err(self.error("Expected LF after CR"))
                }
            }
            b' ' => {
                self.advance();
                Ok(Token::Space)
            }
            b'(' => {
                self.advance();
                Ok(Token::LParen)
            }
            b')' => {
                self.advance();
                Ok(Token::RParen)
            }
            b'"' => self.read_quoted_string(),
            b'{' => self.read_literal(),
            _ if is_atom_char(byte) => self.read_atom(),
            _ => Err(self.error(&format!("Unexpected character: {byte:#04x}"))),
        }
    }

    /// Reads a quoted string token.
    ///
    /// Everything up to the closing quote is taken verbatim, including `<`,
    /// `>` and control characters. Only `\"` and `\\` are unescaped; any
    /// other backslash is kept as written.
    fn read_quoted_string(&mut self) -> Result<Token<'a>> {
        self.advance(); // Skip opening quote

        let mut result = Vec::new();

        loop {
            match self.advance() {
                Some(b'"') => break,
                Some(b'\\') => match self.peek() {
                    Some(c @ (b'"' | b'\\')) => {
                        self.advance();
                        result.push(c);
                    }
                    Some(_) => result.push(b'\\'),
                    None => return Err(self.error("Unterminated quoted string")),
                },
                Some(b'\r' | b'\n') | None => {
                    return Err(self.error("Unterminated quoted string"));
                }
                Some(c) => result.push(c),
            }
        }

        let s =
            String::from_utf8(result).map_err(|_| self.error("Invalid UTF-8 in quoted string"))?;

        Ok(Token::QuotedString(s))
    }

    /// Reads a `{n}` or `{n+}` prefix followed by CRLF and `n` raw bytes.
    fn read_literal(&mut self) -> Result<Token<'a>> {
        self.advance(); // Skip {

        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }
        let digits = &self.input[start..self.pos];

        if self.peek() == Some(b'+') {
            self.advance();
        }

        match self.advance() {
            Some(b'}') => {}
            None => return Err(self.error("Missing } in literal size")),
            Some(_) => return Err(self.error("Invalid character in literal size")),
        }

        let size = parse_literal_size(digits).ok_or_else(|| self.error("Invalid literal size"))?;

        if self.advance() != Some(b'\r') || self.advance() != Some(b'\n') {
            return Err(self.error("Expected CRLF after literal size"));
        }

        let end = self
            .pos
            .checked_add(size)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| self.error("Incomplete literal data"))?;

        let data = &self.input[self.pos..end];
        self.pos = end;

        Ok(Token::Literal(data))
    }

    /// Reads an atom token.
    fn read_atom(&mut self) -> Result<Token<'a>> {
        let start = self.pos;

        while let Some(b) = self.peek() {
            if b == b'[' {
                self.read_section()?;
            } else if is_atom_char(b) {
                self.advance();
            } else {
                break;
            }
        }

        let s = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("Invalid UTF-8 in atom"))?;

        Ok(Token::Atom(s))
    }

    /// Consumes a bracketed section, spaces and parentheses included.
    ///
    /// Must be entered on the opening `[`.
    fn read_section(&mut self) -> Result<()> {
        debug_assert_eq!(self.peek(), Some(b'['));
        let mut depth = 0usize;
        while let Some(b) = self.advance() {
            match b {
                b'[' => depth += 1,
                b']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'\r' | b'\n' => break,
                _ => {}
            }
        }
        Err(self.error("Unterminated [ section"))
    }

    /// Creates a syntax error at the current position.
    fn error(&self, message: &str) -> Error {
        Error::Syntax {
            position: self.pos,
            message: message.to_string(),
        }
    }

    /// Skips optional spaces.
    pub fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.advance();
        }
    }
}

/// Parses the digits of a literal size prefix.
///
/// Returns `None` if there are no digits or the value overflows `usize`.
#[must_use]
pub fn parse_literal_size(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Returns true if the byte may appear in an atom sent by a client.
///
/// This is wider than the RFC `ATOM-CHAR`: sequence sets (`1:*`), flags
/// (`\Seen`), list wildcards (`%`, `*`), `.SILENT` suffixes and `<0.100>`
/// partial specifiers all scan as one atom. High-bit bytes are accepted so
/// UTF-8 mailbox names pass through.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    b > 0x20 && b != 0x7F && !matches!(b, b'(' | b')' | b'{' | b'"')
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn tokens(input: &[u8]) -> Vec<Token<'_>> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn test_tagged_command() {
        assert_eq!(
            tokens(b"A001 LOGIN alice secret"),
            vec![
                Token::Atom("A001"),
                Token::Space,
                Token::Atom("LOGIN"),
                Token::Space,
                Token::Atom("alice"),
                Token::Space,
                Token::Atom("secret"),
            ]
        );
    }

    #[test]
    fn test_sequence_and_flags_are_atoms() {
        assert_eq!(
            tokens(b"1:* +FLAGS.SILENT (\\Seen)"),
            vec![
                Token::Atom("1:*"),
                Token::Space,
                Token::Atom("+FLAGS.SILENT"),
                Token::Space,
                Token::LParen,
                Token::Atom("\\Seen"),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_quoted_string_escaped() {
        assert_eq!(
            tokens(b"\"hello \\\"world\\\"\""),
            vec![Token::QuotedString("hello \"world\"".to_string())]
        );
    }

    #[test]
    fn test_quoted_string_passes_angle_brackets() {
        assert_eq!(
            tokens(b"\"<a@b.c> \\d\""),
            vec![Token::QuotedString("<a@b.c> \\d".to_string())]
        );
    }

    #[test]
    fn test_unterminated_quote_fails() {
        let mut lexer = Lexer::new(b"\"abc");
        assert!(matches!(lexer.next_token(), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_literal() {
        assert_eq!(tokens(b"{5}\r\nhello"), vec![Token::Literal(b"hello")]);
    }

    #[test]
    fn test_non_synchronizing_literal() {
        assert_eq!(tokens(b"{2+}\r\nhi x"), vec![
            Token::Literal(b"hi"),
            Token::Space,
            Token::Atom("x"),
        ]);
    }

    #[test]
    fn test_zero_literal_is_present_and_empty() {
        assert_eq!(tokens(b"{0}\r\n"), vec![Token::Literal(b"")]);
    }

    #[test]
    fn test_literal_keeps_raw_bytes() {
        let input = b"{4}\r\n\x00\xff\r\n";
        assert_eq!(tokens(input), vec![Token::Literal(b"\x00\xff\r\n")]);
    }

    #[test]
    fn test_bad_literal_prefixes() {
        for input in [&b"{5\r\nhello"[..], b"{x}\r\n", b"{}\r\n", b"{3}abc", b"{9}\r\nabc"] {
            let mut lexer = Lexer::new(input);
            assert!(lexer.next_token().is_err(), "{input:?}");
        }
    }

    #[test]
    fn test_section_stays_in_atom() {
        assert_eq!(
            tokens(b"BODY.PEEK[HEADER.FIELDS (FROM TO)]<0.100> UID"),
            vec![
                Token::Atom("BODY.PEEK[HEADER.FIELDS (FROM TO)]<0.100>"),
                Token::Space,
                Token::Atom("UID"),
            ]
        );
    }

    #[test]
    fn test_nested_section_brackets() {
        assert_eq!(tokens(b"BODY[1[2]3]"), vec![Token::Atom("BODY[1[2]3]")]);
        let mut lexer = Lexer::new(b"BODY[1[2]");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_unterminated_section_fails() {
        let mut lexer = Lexer::new(b"BODY[TEXT");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_is_atom_char() {
        assert!(is_atom_char(b'A'));
        assert!(is_atom_char(b':'));
        assert!(is_atom_char(b'\\'));
        assert!(is_atom_char(b'*'));
        assert!(is_atom_char(b'%'));
        assert!(!is_atom_char(b' '));
        assert!(!is_atom_char(b'('));
        assert!(!is_atom_char(b'{'));
        assert!(!is_atom_char(b'"'));
        assert!(!is_atom_char(0x7F));
    }
}
