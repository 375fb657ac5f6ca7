//! Stream types for accepted SMTP connections.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::server::TlsStream;

use crate::error::{Error, Result};

/// A byte stream that can be switched to TLS mid-session.
#[async_trait]
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + Sized {
    /// Returns true if the stream is TLS-encrypted.
    fn is_tls(&self) -> bool;

    /// Runs the server side of a TLS handshake over this stream.
    async fn upgrade(self, acceptor: &TlsAcceptor) -> Result<Self>;
}

/// An accepted connection, plaintext or TLS.
pub enum SmtpStream {
    /// Plaintext TCP stream.
    Plain(TcpStream),
    /// TLS-encrypted stream (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
}

impl SmtpStream {
    /// Wraps a plaintext stream.
    #[must_use]
    pub const fn plain(stream: TcpStream) -> Self {
        Self::Plain(stream)
    }

    /// Runs the TLS handshake on a freshly accepted socket.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the handshake fails.
    pub async fn accept_tls(stream: TcpStream, acceptor: &TlsAcceptor) -> Result<Self> {
        let tls = acceptor.accept(stream).await?;
        Ok(Self::Tls(Box::new(tls)))
    }
}

#[async_trait]
impl Transport for SmtpStream {
    fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    async fn upgrade(self, acceptor: &TlsAcceptor) -> Result<Self> {
        match self {
            Self::Plain(stream) => Self::accept_tls(stream, acceptor).await,
            Self::Tls(_) => Err(Error::Protocol("Already using TLS".into())),
        }
    }
}

impl AsyncRead for SmtpStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for SmtpStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}
