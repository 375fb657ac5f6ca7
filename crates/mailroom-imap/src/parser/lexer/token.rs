//! IMAP token types.

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Atom (unquoted run of non-special characters).
    ///
    /// A bracketed section such as `BODY[HEADER.FIELDS (FROM)]` is part of
    /// the atom it follows.
    Atom(&'a str),
    /// Quoted string, with `\"` and `\\` unescaped.
    QuotedString(String),
    /// Literal data following a `{n}` or `{n+}` prefix.
    Literal(&'a [u8]),
    /// Opening parenthesis.
    LParen,
    /// Closing parenthesis.
    RParen,
    /// Space character.
    Space,
    /// CRLF line ending.
    Crlf,
    /// End of input.
    Eof,
}
