//! # mailroom-smtp
//!
//! Server side of SMTP (RFC 5321) for a personal mail domain.
//!
//! One listener type serves three roles:
//!
//! - **Relay** (port 25): mail from the internet for local users. AUTH is
//!   refused until STARTTLS.
//! - **Submission** (port 587): STARTTLS, AUTH allowed before the upgrade.
//! - **Implicit** (port 465): TLS from the first byte.
//!
//! ## Flows
//!
//! ```text
//! MAIL FROM:<x@local>  ── requires AUTH ──→ Outgoing ──→ Backend::relay
//! MAIL FROM:<x@remote> ──────────────────→ Incoming ──→ Backend::deliver
//!                                           (local recipients only)
//! ```
//!
//! The [`Session`] is sans-I/O and can be driven line by line:
//!
//! ```
//! use mailroom_smtp::parse_command;
//! use mailroom_smtp::command::Command;
//!
//! let command = parse_command("MAIL FROM:<> SIZE=100").unwrap();
//! assert!(matches!(command, Command::MailFrom { from: None, size: Some(100), .. }));
//! ```
//!
//! ## Modules
//!
//! - [`command`]: Commands received from clients
//! - [`connection`]: Listener, transport and per-connection driver
//! - [`parser`]: Command parser
//! - [`session`]: Protocol state machine
//! - [`types`]: Core SMTP types (addresses, envelopes, extensions, replies)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod backend;
pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod session;
pub mod types;

pub use backend::{Backend, BackendResult};
pub use connection::{Config, Mode, Server, SmtpStream, Transport};
pub use error::{BackendError, Error, ParseError, Result};
pub use parser::parse_command;
pub use session::{Action, Session, SessionConfig};
pub use types::{
    Address, AuthMechanism, Direction, Envelope, Extension, Reply, ReplyCode, parse_path,
};

/// SMTP protocol version supported.
pub const SMTP_VERSION: &str = "SMTP/ESMTP (RFC 5321)";
