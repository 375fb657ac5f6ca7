//! IMAP connection management.
//!
//! This module provides the server side of the transport:
//! - Listener configuration (bind address, security mode, limits)
//! - TLS/plaintext stream abstraction
//! - Framed I/O that feeds the resumable command framer
//! - The per-connection driver and the accept loop

mod config;
mod framed;
mod session;
mod stream;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tracing::{Instrument, error, info, info_span};

pub use config::{Config, Security};
pub use framed::{FramedStream, Inbound};
pub use session::{SessionConfig, serve_connection};
pub use stream::ImapStream;

use crate::backend::Backend;
use crate::{Error, Result};

/// An IMAP listener.
pub struct Server<B: ?Sized> {
    config: Config,
    backend: Arc<B>,
    tls: Option<TlsAcceptor>,
}

impl<B: Backend + ?Sized + 'static> Server<B> {
    /// Creates a listener. `tls` is required for [`Security::Implicit`].
    #[must_use]
    pub const fn new(config: Config, backend: Arc<B>, tls: Option<TlsAcceptor>) -> Self {
        Self {
            config,
            backend,
            tls,
        }
    }

    /// Accepts connections until `must_exit` turns true, then waits for
    /// open sessions to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound, or if implicit TLS
    /// was requested without an acceptor.
    pub async fn run(self, mut must_exit: watch::Receiver<bool>) -> Result<()> {
        let tls = match (self.config.security, self.tls) {
            (Security::Implicit, None) => {
                return Err(Error::Protocol(
                    "implicit TLS listener without a certificate".to_string(),
                ));
            }
            (Security::Implicit, Some(acceptor)) => Some(acceptor),
            (Security::None, _) => None,
        };

        let tcp = TcpListener::bind(self.config.bind_addr).await?;
        info!(addr = %self.config.bind_addr, tls = tls.is_some(), "IMAP server listening");

        let session_config = SessionConfig {
            max_line: self.config.max_line,
            max_literal: self.config.max_literal,
            idle_timeout: self.config.idle_timeout,
        };
        let mut connections = JoinSet::new();

        while !*must_exit.borrow() {
            let (socket, peer) = tokio::select! {
                accepted = tcp.accept() => accepted?,
                Some(_) = connections.join_next(), if !connections.is_empty() => continue,
                _ = must_exit.changed() => continue,
            };
            info!(%peer, "accepted connection");

            let backend = Arc::clone(&self.backend);
            let tls = tls.clone();
            let config = session_config.clone();
            let exit = must_exit.clone();
            let span = info_span!("imap", %peer);
            connections.spawn(
                async move {
                    let stream = match tls {
                        Some(acceptor) => match ImapStream::accept_tls(socket, &acceptor).await {
                            Ok(stream) => stream,
                            Err(err) => {
                                error!(error = %err, "TLS handshake failed");
                                return;
                            }
                        },
                        None => ImapStream::plain(socket),
                    };
                    match serve_connection(stream, backend, &config, exit).await {
                        Ok(()) => info!("connection closed"),
                        Err(err) => error!(error = %err, "connection closed with error"),
                    }
                }
                .instrument(span),
            );
        }
        drop(tcp);

        info!("IMAP server shutting down, draining remaining connections");
        while connections.join_next().await.is_some() {}
        Ok(())
    }
}
