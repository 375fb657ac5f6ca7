//! Per-connection driver.
//!
//! Pairs a [`LineStream`] with a protocol [`Session`]: send the greeting,
//! then feed one line at a time and flush the replies before reading the
//! next one. STARTTLS rebuilds the line stream around the upgraded
//! transport so nothing sent before the handshake is processed after it.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

use super::lines::LineStream;
use super::stream::Transport;
use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::session::{Action, Session, SessionConfig};
use crate::types::{Reply, ReplyCode};

/// Settings for one connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Protocol settings.
    pub session: Arc<SessionConfig>,
    /// Longest accepted line.
    pub max_line: usize,
    /// How long to wait for the next line.
    pub idle_timeout: Duration,
}

/// Serves one client until it quits, disconnects or the server stops.
///
/// # Errors
///
/// Returns I/O and TLS handshake errors from the transport. Protocol
/// problems are answered on the wire and do not surface here.
pub async fn serve_connection<S, B>(
    stream: S,
    backend: Arc<B>,
    config: &ConnectionConfig,
    tls: Option<&TlsAcceptor>,
    mut must_exit: watch::Receiver<bool>,
) -> Result<()>
where
    S: Transport,
    B: Backend + ?Sized,
{
    let secure = stream.is_tls();
    let mut lines = LineStream::new(stream, config.max_line);
    let mut session = Session::new(backend, Arc::clone(&config.session), secure);

    lines.write_replies(&[session.greeting()]).await?;

    loop {
        let read = tokio::select! {
            read = tokio::time::timeout(config.idle_timeout, lines.read_line()) => match read {
                Ok(read) => read,
                Err(_) => {
                    info!("idle timeout");
                    lines
                        .write_replies(&[shutdown_reply(&config.session.hostname, "Error: timeout exceeded")])
                        .await?;
                    break;
                }
            },
            _ = must_exit.changed() => {
                lines
                    .write_replies(&[shutdown_reply(&config.session.hostname, "Service shutting down")])
                    .await?;
                break;
            }
        };

        let mut replies = Vec::new();
        let action = match read {
            Ok(Some(line)) => session.handle_line(&line, &mut replies).await,
            Ok(None) => {
                if session.in_data() {
                    debug!("client closed during DATA, message discarded");
                }
                break;
            }
            Err(Error::Protocol(reason)) => {
                warn!(%reason, "framing violation");
                replies.push(Reply::single(ReplyCode::SYNTAX_ERROR, "5.5.2 Line too long"));
                Action::Close
            }
            Err(err) => return Err(err),
        };

        lines.write_replies(&replies).await?;
        match action {
            Action::Continue => {}
            Action::Close => break,
            Action::StartTls => {
                let acceptor = tls
                    .ok_or_else(|| Error::Config("STARTTLS offered without a certificate".into()))?;
                let upgraded = lines.into_inner().upgrade(acceptor).await?;
                debug!("STARTTLS handshake complete");
                lines = LineStream::new(upgraded, config.max_line);
                session.tls_started();
            }
        }
    }

    let mut stream = lines.into_inner();
    // The peer may already be gone.
    let _ = stream.shutdown().await;
    Ok(())
}

fn shutdown_reply(hostname: &str, text: &str) -> Reply {
    Reply::single(ReplyCode::SERVICE_UNAVAILABLE, format!("4.3.2 {hostname} {text}"))
}
