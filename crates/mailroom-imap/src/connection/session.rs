//! Per-connection driver.
//!
//! Pairs a [`FramedStream`] with a protocol [`Session`]: send the greeting,
//! then read one command at a time, hand it to the session and flush the
//! responses before reading the next one.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::framed::{FramedStream, Inbound};
use crate::backend::Backend;
use crate::parser::CommandFramer;
use crate::protocol::{Flow, Session};
use crate::response::Response;
use crate::types::Status;
use crate::{Error, Result};

/// Settings for one connection.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Longest accepted command line.
    pub max_line: usize,
    /// Largest accepted literal.
    pub max_literal: usize,
    /// How long to wait for the next command.
    pub idle_timeout: Duration,
}

/// Serves one client until it logs out, disconnects or the server stops.
///
/// # Errors
///
/// Returns I/O errors from the transport. Protocol problems are answered
/// on the wire and do not surface here.
pub async fn serve_connection<S, B>(
    stream: S,
    backend: Arc<B>,
    config: &SessionConfig,
    mut must_exit: watch::Receiver<bool>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    B: Backend + ?Sized,
{
    let framer = CommandFramer::with_limits(config.max_line, config.max_literal);
    let mut framed = FramedStream::with_framer(stream, framer);
    let mut session = Session::new(backend);

    framed.write_response(&session.greeting()).await?;

    loop {
        let inbound = tokio::select! {
            read = tokio::time::timeout(config.idle_timeout, framed.read_command()) => match read {
                Ok(inbound) => inbound,
                Err(_) => {
                    info!("idle timeout");
                    framed
                        .write_response(&bye("Autologout; idle for too long"))
                        .await?;
                    break;
                }
            },
            _ = must_exit.changed() => {
                framed.write_response(&bye("Server shutting down")).await?;
                break;
            }
        };

        let mut responses = Vec::new();
        let flow = match inbound {
            Ok(Inbound::Command(line)) => session.handle_line(&line, &mut responses).await,
            Ok(Inbound::LiteralTooBig { partial, size }) => {
                session.reject_literal(&partial, size, &mut responses);
                Flow::Continue
            }
            Ok(Inbound::Closed { mid_command }) => {
                if mid_command {
                    debug!("client closed mid-command, partial command discarded");
                }
                break;
            }
            Err(Error::Framing(reason)) => {
                warn!(%reason, "framing violation");
                responses.push(bye(&reason));
                Flow::Close
            }
            Err(err) => return Err(err),
        };

        framed.write_responses(&responses).await?;
        if flow == Flow::Close {
            break;
        }
    }

    let mut stream = framed.into_inner();
    // The peer may already be gone.
    let _ = stream.shutdown().await;
    Ok(())
}

fn bye(text: &str) -> Response {
    Response::untagged(Status::Bye, None, text)
}
