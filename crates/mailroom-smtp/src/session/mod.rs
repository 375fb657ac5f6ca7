//! SMTP session state machine.
//!
//! A [`Session`] consumes one line at a time (without CRLF) and pushes the
//! replies it produces; the connection driver owns the socket. During DATA
//! the lines are message content and are never logged.
//!
//! A transaction is classified when `MAIL FROM` arrives. With an
//! authenticated user, a local sender owned by that user (or the null
//! sender) makes it outgoing: remote recipients are relayed and local ones
//! delivered. Everything else is incoming and may only name local
//! recipients; a local sender that names a remote one is told to
//! authenticate.

#![allow(clippy::missing_const_for_fn)]

mod config;

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, error, info, warn};

pub use config::{DEFAULT_MAX_MESSAGE_SIZE, MAX_RECIPIENTS, SessionConfig};

use crate::backend::{Backend, BackendResult};
use crate::command::Command;
use crate::error::{BackendError, ParseError};
use crate::parser::parse_command;
use crate::types::{
    Address, AuthMechanism, Direction, Envelope, Extension, Reply, ReplyCode,
};

/// `Username:` in base64.
const LOGIN_USERNAME: &str = "VXNlcm5hbWU6";
/// `Password:` in base64.
const LOGIN_PASSWORD: &str = "UGFzc3dvcmQ6";

/// What the driver should do after flushing the replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep reading lines.
    Continue,
    /// Run the TLS handshake, then call [`Session::tls_started`].
    StartTls,
    /// Close the connection.
    Close,
}

/// What the next line means.
#[derive(Debug)]
enum Mode {
    Command,
    Data { buffer: Vec<u8>, overflow: bool },
    AuthPlain,
    AuthLoginUser,
    AuthLoginPass(String),
}

/// Envelope under construction.
#[derive(Debug)]
struct Transaction {
    direction: Direction,
    from: Option<Address>,
    /// Sender is in the local domain.
    local_sender: bool,
    recipients: Vec<Address>,
}

/// Per-connection SMTP session.
pub struct Session<B: ?Sized> {
    backend: Arc<B>,
    config: Arc<SessionConfig>,
    tls: bool,
    client: Option<String>,
    user: Option<String>,
    mode: Mode,
    transaction: Option<Transaction>,
}

impl<B: Backend + ?Sized> Session<B> {
    /// Creates a session; `tls` says whether the stream is already encrypted.
    #[must_use]
    pub fn new(backend: Arc<B>, config: Arc<SessionConfig>, tls: bool) -> Self {
        Self {
            backend,
            config,
            tls,
            client: None,
            user: None,
            mode: Mode::Command,
            transaction: None,
        }
    }

    /// Returns the server greeting.
    #[must_use]
    pub fn greeting(&self) -> Reply {
        Reply::single(
            ReplyCode::SERVICE_READY,
            format!("{} ESMTP mailroom ready", self.config.hostname),
        )
    }

    /// Returns the authenticated user id.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Returns true once the stream is encrypted.
    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.tls
    }

    /// Returns true while message content is being received.
    #[must_use]
    pub fn in_data(&self) -> bool {
        matches!(self.mode, Mode::Data { .. })
    }

    /// Resets the session after a completed STARTTLS handshake.
    ///
    /// The client must greet again; nothing learned before the upgrade
    /// survives it.
    pub fn tls_started(&mut self) {
        self.tls = true;
        self.client = None;
        self.user = None;
        self.mode = Mode::Command;
        self.transaction = None;
    }

    /// Handles one line and pushes the replies.
    pub async fn handle_line(&mut self, line: &[u8], out: &mut Vec<Reply>) -> Action {
        match std::mem::replace(&mut self.mode, Mode::Command) {
            Mode::Command => {}
            Mode::Data { buffer, overflow } => {
                return self.data_line(line, buffer, overflow, out).await;
            }
            Mode::AuthPlain => {
                if let Some(decoded) = decode_response(line, out) {
                    self.finish_plain(&decoded, out).await;
                }
                return Action::Continue;
            }
            Mode::AuthLoginUser => {
                if let Some(decoded) = decode_response(line, out) {
                    match String::from_utf8(decoded) {
                        Ok(username) => {
                            self.mode = Mode::AuthLoginPass(username);
                            out.push(Reply::single(ReplyCode::AUTH_CONTINUE, LOGIN_PASSWORD));
                        }
                        Err(_) => out.push(malformed_auth()),
                    }
                }
                return Action::Continue;
            }
            Mode::AuthLoginPass(username) => {
                if let Some(decoded) = decode_response(line, out) {
                    match String::from_utf8(decoded) {
                        Ok(password) => self.check_credentials(&username, &password, out).await,
                        Err(_) => out.push(malformed_auth()),
                    }
                }
                return Action::Continue;
            }
        }

        let Ok(text) = std::str::from_utf8(line) else {
            out.push(Reply::single(ReplyCode::SYNTAX_ERROR, "5.5.2 Invalid characters in command"));
            return Action::Continue;
        };

        match parse_command(text) {
            Ok(command) => self.execute(command, out).await,
            Err(ParseError::Unrecognized(verb)) => {
                warn!(verb = %verb, "unrecognized command");
                out.push(Reply::single(ReplyCode::SYNTAX_ERROR, "5.5.2 Command unrecognized"));
                Action::Continue
            }
            Err(ParseError::Syntax(reason)) => {
                warn!(reason = %reason, "rejected command");
                out.push(Reply::single(ReplyCode::PARAMETER_ERROR, format!("5.5.4 {reason}")));
                Action::Continue
            }
        }
    }

    /// Executes a parsed command.
    pub async fn execute(&mut self, command: Command, out: &mut Vec<Reply>) -> Action {
        debug!(command = command.name(), "executing");

        let needs_greeting = matches!(
            command,
            Command::Auth { .. } | Command::MailFrom { .. } | Command::RcptTo { .. } | Command::Data
        );
        if needs_greeting && self.client.is_none() {
            out.push(bad_sequence("Send HELO/EHLO first"));
            return Action::Continue;
        }

        match command {
            Command::Helo { hostname } => {
                out.push(Reply::single(ReplyCode::OK, self.hello(hostname)));
            }
            Command::Ehlo { hostname } => {
                let mut lines = vec![self.hello(hostname)];
                lines.extend(self.extensions().iter().map(ToString::to_string));
                out.push(Reply::new(ReplyCode::OK, lines));
            }
            Command::StartTls => {
                if self.tls {
                    out.push(bad_sequence("TLS already active"));
                } else if !self.config.starttls {
                    out.push(Reply::single(ReplyCode::TEMPORARY_FAILURE, "4.7.0 TLS not available"));
                } else {
                    out.push(Reply::single(ReplyCode::SERVICE_READY, "2.0.0 Ready to start TLS"));
                    return Action::StartTls;
                }
            }
            Command::Auth {
                mechanism,
                initial_response,
            } => self.auth(mechanism, initial_response, out).await,
            Command::MailFrom { from, size, .. } => self.mail(from, size, out).await,
            Command::RcptTo { to } => self.rcpt(to, out).await,
            Command::Data => match &self.transaction {
                None => out.push(bad_sequence("Need MAIL command")),
                Some(t) if t.recipients.is_empty() => out.push(bad_sequence("Need RCPT command")),
                Some(_) => {
                    self.mode = Mode::Data {
                        buffer: Vec::new(),
                        overflow: false,
                    };
                    out.push(Reply::single(
                        ReplyCode::START_DATA,
                        "End data with <CR><LF>.<CR><LF>",
                    ));
                }
            },
            Command::Rset => {
                self.transaction = None;
                out.push(ok());
            }
            Command::Noop => out.push(ok()),
            Command::Vrfy { .. } => out.push(Reply::single(
                ReplyCode::CANNOT_VERIFY,
                "2.5.0 Cannot VRFY user, but will accept message and attempt delivery",
            )),
            Command::Quit => {
                out.push(Reply::single(
                    ReplyCode::CLOSING,
                    format!("2.0.0 {} closing connection", self.config.hostname),
                ));
                return Action::Close;
            }
        }
        Action::Continue
    }

    /// Records the client name and drops any open transaction.
    fn hello(&mut self, client: String) -> String {
        let line = format!("{} Hello {client}", self.config.hostname);
        self.client = Some(client);
        self.transaction = None;
        line
    }

    fn auth_allowed(&self) -> bool {
        self.tls || self.config.allow_insecure_auth
    }

    /// Extensions for the EHLO reply in the current state.
    fn extensions(&self) -> Vec<Extension> {
        let mut extensions = vec![
            Extension::Pipelining,
            Extension::EightBitMime,
            Extension::Size(Some(self.config.max_message_size)),
            Extension::EnhancedStatusCodes,
        ];
        if self.config.starttls && !self.tls {
            extensions.push(Extension::StartTls);
        }
        if self.auth_allowed() {
            extensions.push(Extension::Auth(AuthMechanism::SUPPORTED.to_vec()));
        }
        extensions
    }

    async fn auth(
        &mut self,
        mechanism: AuthMechanism,
        initial_response: Option<String>,
        out: &mut Vec<Reply>,
    ) {
        if self.user.is_some() {
            out.push(bad_sequence("Already authenticated"));
            return;
        }
        if self.transaction.is_some() {
            out.push(bad_sequence("AUTH not permitted during a mail transaction"));
            return;
        }
        if !self.auth_allowed() {
            out.push(Reply::single(
                ReplyCode::ENCRYPTION_REQUIRED,
                "5.7.11 Encryption required for requested authentication mechanism",
            ));
            return;
        }

        match (mechanism, initial_response) {
            (AuthMechanism::Plain, None) => {
                self.mode = Mode::AuthPlain;
                out.push(Reply::single(ReplyCode::AUTH_CONTINUE, ""));
            }
            (AuthMechanism::Plain, Some(initial)) => {
                if let Some(decoded) = decode_response(initial.as_bytes(), out) {
                    self.finish_plain(&decoded, out).await;
                }
            }
            (AuthMechanism::Login, None) => {
                self.mode = Mode::AuthLoginUser;
                out.push(Reply::single(ReplyCode::AUTH_CONTINUE, LOGIN_USERNAME));
            }
            (AuthMechanism::Login, Some(initial)) => {
                if let Some(decoded) = decode_response(initial.as_bytes(), out) {
                    match String::from_utf8(decoded) {
                        Ok(username) => {
                            self.mode = Mode::AuthLoginPass(username);
                            out.push(Reply::single(ReplyCode::AUTH_CONTINUE, LOGIN_PASSWORD));
                        }
                        Err(_) => out.push(malformed_auth()),
                    }
                }
            }
        }
    }

    /// Checks a decoded `authzid NUL authcid NUL passwd` message.
    async fn finish_plain(&mut self, decoded: &[u8], out: &mut Vec<Reply>) {
        let parts: Vec<&[u8]> = decoded.split(|&b| b == 0).collect();
        let [_, authcid, passwd] = parts.as_slice() else {
            out.push(malformed_auth());
            return;
        };
        match (std::str::from_utf8(authcid), std::str::from_utf8(passwd)) {
            (Ok(username), Ok(password)) => self.check_credentials(username, password, out).await,
            _ => out.push(malformed_auth()),
        }
    }

    async fn check_credentials(&mut self, username: &str, password: &str, out: &mut Vec<Reply>) {
        match self.backend.authenticate(username, password).await {
            Ok(Some(user)) => {
                info!(user = %user, "authenticated");
                self.user = Some(user);
                out.push(Reply::single(ReplyCode::AUTH_SUCCEEDED, "2.7.0 Authentication successful"));
            }
            Ok(None) => {
                warn!(username, "authentication failed");
                out.push(Reply::single(
                    ReplyCode::AUTH_FAILED,
                    "5.7.8 Authentication credentials invalid",
                ));
            }
            Err(err) => {
                error!(error = %err, "credential lookup failed");
                out.push(Reply::single(
                    ReplyCode::TEMPORARY_FAILURE,
                    "4.7.0 Temporary authentication failure",
                ));
            }
        }
    }

    fn is_local(&self, address: &Address) -> bool {
        address.is_in_domain(&self.config.domain)
    }

    async fn mail(&mut self, from: Option<Address>, size: Option<usize>, out: &mut Vec<Reply>) {
        if self.transaction.is_some() {
            out.push(bad_sequence("Sender already specified"));
            return;
        }
        if size.is_some_and(|s| s > self.config.max_message_size) {
            out.push(too_big());
            return;
        }

        let local_sender = from.as_ref().is_some_and(|address| self.is_local(address));
        let direction = if self.user.is_some() && (local_sender || from.is_none()) {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };

        if let (Direction::Outgoing, Some(user), Some(address)) =
            (direction, self.user.as_deref(), from.as_ref())
        {
            match self.backend.owns_address(user, address).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(user, from = %address, "sender address not owned by user");
                    out.push(Reply::single(
                        ReplyCode::MAILBOX_NAME_INVALID,
                        "5.7.1 Sender address rejected: not owned by user",
                    ));
                    return;
                }
                Err(err) => {
                    error!(error = %err, "sender lookup failed");
                    out.push(local_error());
                    return;
                }
            }
        }

        debug!(?direction, local_sender, "transaction started");
        self.transaction = Some(Transaction {
            direction,
            from,
            local_sender,
            recipients: Vec::new(),
        });
        out.push(Reply::single(ReplyCode::OK, "2.1.0 Sender ok"));
    }

    async fn rcpt(&mut self, to: Address, out: &mut Vec<Reply>) {
        let local = self.is_local(&to);
        let Some(transaction) = self.transaction.as_ref() else {
            out.push(bad_sequence("Need MAIL command"));
            return;
        };
        if transaction.recipients.len() >= MAX_RECIPIENTS {
            out.push(Reply::single(ReplyCode::INSUFFICIENT_STORAGE, "4.5.3 Too many recipients"));
            return;
        }
        if !local && transaction.direction == Direction::Incoming {
            if transaction.local_sender {
                warn!(to = %to, "local sender without AUTH");
                out.push(Reply::single(ReplyCode::AUTH_REQUIRED, "5.7.0 Authentication required"));
            } else {
                warn!(to = %to, "relay attempt refused");
                out.push(Reply::single(ReplyCode::TRANSACTION_FAILED, "5.7.1 Relay access denied"));
            }
            return;
        }

        if local {
            match self.backend.user_exists(&to).await {
                Ok(true) => {}
                Ok(false) => {
                    out.push(Reply::single(
                        ReplyCode::MAILBOX_UNAVAILABLE,
                        "5.1.1 Mailbox unavailable",
                    ));
                    return;
                }
                Err(err) => {
                    error!(error = %err, "recipient lookup failed");
                    out.push(local_error());
                    return;
                }
            }
        }

        if let Some(transaction) = self.transaction.as_mut() {
            transaction.recipients.push(to);
        }
        out.push(Reply::single(ReplyCode::OK, "2.1.5 Recipient ok"));
    }

    async fn data_line(
        &mut self,
        line: &[u8],
        mut buffer: Vec<u8>,
        mut overflow: bool,
        out: &mut Vec<Reply>,
    ) -> Action {
        if line == b"." {
            self.finish_data(&buffer, overflow, out).await;
            return Action::Continue;
        }

        let line = line.strip_prefix(b".").unwrap_or(line);
        if !overflow {
            if buffer.len() + line.len() + 2 > self.config.max_message_size {
                overflow = true;
                buffer = Vec::new();
            } else {
                buffer.extend_from_slice(line);
                buffer.extend_from_slice(b"\r\n");
            }
        }
        self.mode = Mode::Data { buffer, overflow };
        Action::Continue
    }

    async fn finish_data(&mut self, message: &[u8], overflow: bool, out: &mut Vec<Reply>) {
        let Some(transaction) = self.transaction.take() else {
            out.push(bad_sequence("Need MAIL command"));
            return;
        };
        if overflow {
            warn!("message over size limit discarded");
            out.push(too_big());
            return;
        }

        let direction = transaction.direction;
        let recipients = transaction.recipients.len();
        let envelope = Envelope {
            direction,
            from: transaction.from,
            recipients: transaction.recipients,
            user: self.user.clone(),
        };
        let result: BackendResult<()> = match direction {
            Direction::Incoming => self.backend.deliver(&envelope, message).await,
            Direction::Outgoing => self.send_outgoing(envelope, message).await,
        };

        match result {
            Ok(()) => {
                info!(
                    ?direction,
                    recipients,
                    size = message.len(),
                    "message accepted"
                );
                out.push(Reply::single(ReplyCode::OK, "2.0.0 Message accepted"));
            }
            Err(BackendError::Temporary(reason)) => {
                error!(reason = %reason, "message hand-off failed");
                out.push(local_error());
            }
            Err(BackendError::Permanent(reason)) => {
                error!(reason = %reason, "message refused");
                out.push(Reply::single(ReplyCode::TRANSACTION_FAILED, "5.3.0 Transaction failed"));
            }
        }
    }

    /// Relays to the remote recipients, then delivers to the local ones.
    ///
    /// The relay call happens even when every recipient is local; the
    /// backend keeps the sent copy there.
    async fn send_outgoing(&self, envelope: Envelope, message: &[u8]) -> BackendResult<()> {
        let (local, remote): (Vec<Address>, Vec<Address>) = envelope
            .recipients
            .into_iter()
            .partition(|address| self.is_local(address));
        let outgoing = Envelope {
            recipients: remote,
            ..envelope
        };
        self.backend.relay(&outgoing, message).await?;
        if !local.is_empty() {
            let local = Envelope {
                recipients: local,
                ..outgoing
            };
            self.backend.deliver(&local, message).await?;
        }
        Ok(())
    }
}

/// Decodes one base64 SASL line, pushing the error reply on failure.
fn decode_response(line: &[u8], out: &mut Vec<Reply>) -> Option<Vec<u8>> {
    if line == b"*" {
        out.push(Reply::single(ReplyCode::PARAMETER_ERROR, "5.7.0 Authentication cancelled"));
        return None;
    }
    if line == b"=" {
        return Some(Vec::new());
    }
    match BASE64.decode(line) {
        Ok(decoded) => Some(decoded),
        Err(_) => {
            out.push(Reply::single(ReplyCode::PARAMETER_ERROR, "5.5.2 Invalid base64 data"));
            None
        }
    }
}

fn ok() -> Reply {
    Reply::single(ReplyCode::OK, "2.0.0 Ok")
}

fn bad_sequence(text: &str) -> Reply {
    Reply::single(ReplyCode::BAD_SEQUENCE, format!("5.5.1 {text}"))
}

fn malformed_auth() -> Reply {
    Reply::single(ReplyCode::PARAMETER_ERROR, "5.5.2 Malformed authentication response")
}

fn too_big() -> Reply {
    Reply::single(
        ReplyCode::EXCEEDED_STORAGE,
        "5.3.4 Message size exceeds fixed maximum message size",
    )
}

fn local_error() -> Reply {
    Reply::single(ReplyCode::LOCAL_ERROR, "4.3.0 Local error in processing")
}
