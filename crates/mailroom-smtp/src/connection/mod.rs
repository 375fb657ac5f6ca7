//! SMTP connection management.
//!
//! This module provides the server side of the transport:
//! - Listener configuration (bind address, role, limits)
//! - TLS/plaintext stream abstraction with STARTTLS upgrade
//! - Line I/O and the per-connection driver
//! - The accept loop

mod config;
mod lines;
mod session;
mod stream;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tracing::{Instrument, error, info, info_span};

pub use config::{Config, MAX_LINE_LENGTH, Mode};
pub use lines::LineStream;
pub use session::{ConnectionConfig, serve_connection};
pub use stream::{SmtpStream, Transport};

use crate::backend::Backend;
use crate::error::{Error, Result};

/// An SMTP listener.
pub struct Server<B: ?Sized> {
    config: Config,
    backend: Arc<B>,
    tls: Option<TlsAcceptor>,
}

impl<B: Backend + ?Sized + 'static> Server<B> {
    /// Creates a listener. `tls` is required for [`Mode::Submission`] and
    /// [`Mode::Implicit`]; on [`Mode::Relay`] it enables STARTTLS.
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
    /// Returns an error if the address cannot be bound, or if a TLS mode
    /// was requested without an acceptor.
    pub async fn run(self, mut must_exit: watch::Receiver<bool>) -> Result<()> {
        if self.config.mode.requires_tls() && self.tls.is_none() {
            return Err(Error::Config(format!(
                "{:?} listener without a certificate",
                self.config.mode
            )));
        }
        let implicit = self.config.mode == Mode::Implicit;

        let tcp = TcpListener::bind(self.config.bind_addr).await?;
        info!(
            addr = %self.config.bind_addr,
            mode = ?self.config.mode,
            "SMTP server listening"
        );

        let connection_config = ConnectionConfig {
            session: Arc::new(self.config.session_config(self.tls.is_some())),
            max_line: self.config.max_line,
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
            let tls = self.tls.clone();
            let config = connection_config.clone();
            let exit = must_exit.clone();
            let span = info_span!("smtp", %peer);
            connections.spawn(
                async move {
                    let stream = match (&tls, implicit) {
                        (Some(acceptor), true) => {
                            match SmtpStream::accept_tls(socket, acceptor).await {
                                Ok(stream) => stream,
                                Err(err) => {
                                    error!(error = %err, "TLS handshake failed");
                                    return;
                                }
                            }
                        }
                        _ => SmtpStream::plain(socket),
                    };
                    match serve_connection(stream, backend, &config, tls.as_ref(), exit).await {
                        Ok(()) => info!("connection closed"),
                        Err(err) => error!(error = %err, "connection closed with error"),
                    }
                }
                .instrument(span),
            );
        }
        drop(tcp);

        info!("SMTP server shutting down, draining remaining connections");
        while connections.join_next().await.is_some() {}
        Ok(())
    }
}
