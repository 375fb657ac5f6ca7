//! Resumable command framing.
//!
//! Client commands are CRLF-terminated lines, except that a line ending in
//! `{n}` is followed by exactly `n` raw bytes and then the rest of the
//! command. The framer is fed whatever the transport delivered and reports
//! what it needs next, so the connection can send a continuation request
//! and wait for the literal without re-scanning the consumed prefix.

use bytes::{Buf, BytesMut};

use crate::{Error, Result};

/// Maximum length of one command line.
pub const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Maximum size of one literal.
pub const MAX_LITERAL_SIZE: usize = 50 * 1024 * 1024; // 50 MB

/// Largest command a framer built with [`CommandFramer::with_limits`]
/// accepts: one full literal plus one full line.
const fn command_limit(max_line: usize, max_literal: usize) -> usize {
    max_line.saturating_add(max_literal)
}

/// What the framer needs or produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A whole command, literals included, without the final CRLF.
    Complete(Vec<u8>),
    /// More bytes are needed to finish the current line.
    NeedLine,
    /// A synchronizing literal was announced; the server must send a
    /// continuation request before the client sends the bytes.
    Continue {
        /// Declared literal size.
        size: usize,
    },
    /// Waiting for the rest of a literal.
    NeedLiteral {
        /// Bytes still missing.
        remaining: usize,
    },
    /// A synchronizing literal over the size limit was announced.
    ///
    /// The partial command is discarded; `partial` holds the text read so
    /// far so the caller can still recover the tag for a tagged `NO`.
    LiteralTooBig {
        /// Command text up to the literal prefix.
        partial: Vec<u8>,
        /// Declared literal size.
        size: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Line,
    Literal { remaining: usize },
}

/// Assembles complete commands from a byte stream.
#[derive(Debug)]
pub struct CommandFramer {
    buffer: BytesMut,
    command: Vec<u8>,
    state: State,
    max_line: usize,
    max_literal: usize,
    max_command: usize,
}

impl Default for CommandFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandFramer {
    /// Creates a framer with the default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(MAX_LINE_LENGTH, MAX_LITERAL_SIZE)
    }

    /// Creates a framer with custom limits.
    ///
    /// A whole command, lines and literals together, may not exceed
    /// `max_line + max_literal` bytes.
    #[must_use]
    pub fn with_limits(max_line: usize, max_literal: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            command: Vec::new(),
            state: State::Line,
            max_line,
            max_literal,
            max_command: command_limit(max_line, max_literal),
        }
    }

    /// Bytes the command would hold after appending `extra`.
    fn command_len_with(&self, extra: usize) -> usize {
        self.command.len().saturating_add(extra)
    }

    /// Appends bytes received from the transport.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Returns true if a command is partially assembled.
    #[must_use]
    pub fn in_command(&self) -> bool {
        !self.command.is_empty() || self.state != State::Line
    }

    /// Drops any partially assembled command.
    pub fn reset(&mut self) {
        self.command.clear();
        self.state = State::Line;
    }

    /// Advances as far as the buffered bytes allow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Framing`] if a line exceeds the line limit, if a
    /// non-synchronizing literal exceeds the literal limit, or if the
    /// command as a whole grows past the command limit without a
    /// synchronizing literal to refuse. These leave the stream
    /// unrecoverable.
    pub fn poll(&mut self) -> Result<Frame> {
        loop {
            match self.state {
                State::Literal { remaining } => {
                    if remaining == 0 {
                        self.state = State::Line;
                        continue;
                    }
                    let take = remaining.min(self.buffer.len());
                    self.command.extend_from_slice(&self.buffer[..take]);
                    self.buffer.advance(take);
                    let remaining = remaining - take;
                    self.state = State::Literal { remaining };
                    if remaining > 0 {
                        return Ok(Frame::NeedLiteral { remaining });
                    }
                }
                State::Line => {
                    let Some(pos) = find_crlf(&self.buffer) else {
                        if self.buffer.len() > self.max_line {
                            return Err(Error::Framing("line too long".to_string()));
                        }
                        return Ok(Frame::NeedLine);
                    };
                    if pos > self.max_line {
                        return Err(Error::Framing("line too long".to_string()));
                    }

                    let line = self.buffer.split_to(pos + 2);
                    let line = &line[..pos];

                    let Some((size, synchronizing)) = literal_suffix(line) else {
                        if self.command_len_with(line.len()) > self.max_command {
                            return Err(Error::Framing("command too long".to_string()));
                        }
                        self.command.extend_from_slice(line);
                        return Ok(Frame::Complete(std::mem::take(&mut self.command)));
                    };

                    let total = self.command_len_with(line.len() + 2).saturating_add(size);
                    if size > self.max_literal || total > self.max_command {
                        if !synchronizing {
                            return Err(Error::Framing(format!(
                                "literal too large: {size} bytes (max {}, command max {})",
                                self.max_literal, self.max_command
                            )));
                        }
                        let mut partial = std::mem::take(&mut self.command);
                        partial.extend_from_slice(line);
                        self.reset();
                        return Ok(Frame::LiteralTooBig { partial, size });
                    }

                    self.command.extend_from_slice(line);
                    self.command.extend_from_slice(b"\r\n");
                    self.state = State::Literal { remaining: size };

                    if synchronizing {
                        return Ok(Frame::Continue { size });
                    }
                }
            }
        }
    }
}

/// Finds the position of CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Parses a literal prefix at the end of a line.
///
/// Matches `{123}` (synchronizing) or `{123+}`. Malformed prefixes are left
/// for the lexer to reject.
fn literal_suffix(line: &[u8]) -> Option<(usize, bool)> {
    let inner = line.strip_suffix(b"}")?;
    let open = inner.iter().rposition(|&b| b == b'{')?;
    let digits = &inner[open + 1..];
    let (digits, synchronizing) = match digits.strip_suffix(b"+") {
        Some(d) => (d, false),
        None => (digits, true),
    };
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    super::lexer::parse_literal_size(digits).map(|size| (size, synchronizing))
}
