//! Line-oriented I/O over a byte stream.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::types::Reply;

/// Reads CRLF-terminated lines and writes replies.
///
/// A bare LF also ends a line. Bytes read past the current line stay
/// buffered until [`LineStream::into_inner`] drops them.
pub struct LineStream<S> {
    stream: S,
    buffer: BytesMut,
    max_line: usize,
}

impl<S: AsyncRead + AsyncWrite + Unpin> LineStream<S> {
    /// Wraps a stream.
    #[must_use]
    pub fn new(stream: S, max_line: usize) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            max_line,
        }
    }

    /// Reads the next line without its terminator.
    ///
    /// Returns `None` when the peer closes; an unterminated trailing
    /// fragment is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for an overlong line and I/O errors from
    /// the stream.
    pub async fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let mut line = self.buffer.split_to(pos + 1);
                line.truncate(pos);
                if line.last() == Some(&b'\r') {
                    line.truncate(pos - 1);
                }
                if line.len() > self.max_line {
                    return Err(Error::Protocol("line too long".into()));
                }
                return Ok(Some(line.to_vec()));
            }
            if self.buffer.len() > self.max_line + 1 {
                return Err(Error::Protocol("line too long".into()));
            }

            self.buffer.reserve(4096);
            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                self.buffer.clear();
                return Ok(None);
            }
        }
    }

    /// Writes replies and flushes once.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from the stream.
    pub async fn write_replies(&mut self, replies: &[Reply]) -> Result<()> {
        if replies.is_empty() {
            return Ok(());
        }
        let mut out = Vec::new();
        for reply in replies {
            reply.encode(&mut out);
        }
        self.stream.write_all(&out).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Returns a reference to the underlying stream.
    #[must_use]
    pub const fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Returns the stream, discarding anything buffered.
    pub fn into_inner(self) -> S {
        self.stream
    }
}
