//! Framed I/O for the server side of an IMAP connection.
//!
//! Incoming bytes are handed to a [`CommandFramer`]; outgoing responses are
//! encoded into one buffer and written with a single flush per batch.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::Result;
use crate::parser::{CommandFramer, Frame};
use crate::response::Response;

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Continuation text sent before a synchronizing literal.
const LITERAL_CONTINUATION: &str = "Ready for literal data";

/// What [`FramedStream::read_command`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A complete command line, literals included.
    Command(Vec<u8>),
    /// A synchronizing literal over the limit was refused.
    LiteralTooBig {
        /// Command text before the literal.
        partial: Vec<u8>,
        /// Declared size.
        size: usize,
    },
    /// The client closed the connection.
    ///
    /// `mid_command` is true if a partial command was discarded.
    Closed {
        /// Whether a command was cut off.
        mid_command: bool,
    },
}

/// Framed server connection.
pub struct FramedStream<S> {
    stream: S,
    framer: CommandFramer,
    read_buffer: BytesMut,
    write_buffer: Vec<u8>,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a framed stream with the default limits.
    pub fn new(stream: S) -> Self {
        Self::with_framer(stream, CommandFramer::new())
    }

    /// Creates a framed stream around a configured framer.
    pub fn with_framer(stream: S, framer: CommandFramer) -> Self {
        Self {
            stream,
            framer,
            read_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
            write_buffer: Vec::with_capacity(DEFAULT_BUFFER_SIZE),
        }
    }

    /// Reads until a command is complete.
    ///
    /// Sends `+ Ready for literal data` whenever the client announces a
    /// synchronizing literal.
    ///
    /// # Errors
    ///
    /// Returns an I/O error, or a framing error for an oversized line or
    /// non-synchronizing literal.
    pub async fn read_command(&mut self) -> Result<Inbound> {
        loop {
            match self.framer.poll()? {
                Frame::Complete(line) => return Ok(Inbound::Command(line)),
                Frame::LiteralTooBig { partial, size } => {
                    return Ok(Inbound::LiteralTooBig { partial, size });
                }
                Frame::Continue { size } => {
                    trace!(size, "literal announced");
                    self.write_response(&Response::Continuation(LITERAL_CONTINUATION.to_string()))
                        .await?;
                }
                Frame::NeedLine | Frame::NeedLiteral { .. } => {
                    self.read_buffer.clear();
                    let n = self.stream.read_buf(&mut self.read_buffer).await?;
                    if n == 0 {
                        let mid_command = self.framer.in_command();
                        self.framer.reset();
                        return Ok(Inbound::Closed { mid_command });
                    }
                    self.framer.push(&self.read_buffer[..n]);
                }
            }
        }
    }

    /// Writes one response and flushes.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the write fails.
    pub async fn write_response(&mut self, response: &Response) -> Result<()> {
        self.write_responses(std::slice::from_ref(response)).await
    }

    /// Writes a batch of responses and flushes once.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the write fails.
    pub async fn write_responses(&mut self, responses: &[Response]) -> Result<()> {
        self.write_buffer.clear();
        for response in responses {
            response.encode(&mut self.write_buffer);
        }
        self.stream.write_all(&self.write_buffer).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Gets a reference to the underlying stream.
    pub const fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Consumes the framed stream and returns the inner stream.
    ///
    /// Any buffered input is lost.
    pub fn into_inner(self) -> S {
        self.stream
    }
}
