//! # mailroom-imap
//!
//! The server side of IMAP4rev1 (RFC 3501): everything between the socket
//! and a mailbox store.
//!
//! ## Layers
//!
//! - **Framing** ([`parser::CommandFramer`]): resumable assembly of command
//!   lines and `{n}` literals; reports when a continuation request is due.
//! - **Grammar** ([`parser::parse_command`]): one complete line in, a
//!   [`TaggedCommand`] or a [`ParseError`] out. Never panics on client input.
//! - **Session** ([`Session`]): the `NotAuthenticated → Authenticated →
//!   Selected` state machine. Each command becomes at most one mutating
//!   [`Backend`] call and a list of [`Response`]s.
//! - **Transport** ([`connection`]): accept loop, TLS, one task per client.
//!
//! ## Example
//!
//! ```
//! use mailroom_imap::parser::parse_command;
//! use mailroom_imap::{Command, UidCommand};
//!
//! let parsed = parse_command(b"1.1 UID STORE 1 +FLAGS.SILENT (\\Seen)").unwrap();
//! assert_eq!(parsed.tag.as_str(), "1.1");
//! assert!(matches!(parsed.command, Command::Uid(UidCommand::Store(_))));
//! ```
//!
//! ## Session States
//!
//! ```text
//! ┌─────────────────────┐
//! │   NotAuthenticated  │ ─── LOGIN / AUTHENTICATE ───→ Authenticated
//! └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    Authenticated    │ ─── SELECT / EXAMINE ───→ Selected
//! └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │      Selected       │ ─── CLOSE ───→ Authenticated
//! └─────────────────────┘
//! ```
//!
//! LOGOUT is accepted in every state and ends the connection.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod command;
pub mod connection;
mod error;
pub mod fetch;
pub mod parser;
pub mod protocol;
pub mod response;
pub mod search;
pub mod types;

pub use backend::{Backend, BackendResult, MailboxInfo, MessageMeta};
pub use command::{Command, SearchCriteria, StatusAttribute, TaggedCommand, UidCommand};
pub use connection::{Config, ImapStream, Security, Server};
pub use error::{BackendError, Error, ParseError, Result};
pub use protocol::{Flow, Session, SessionState};
pub use response::{Address, Envelope, FetchValue, Response};
pub use types::{
    Capability, Flag, FlagSet, Mailbox, MailboxAttribute, MailboxStatus, ResponseCode,
    SequenceSet, Status, Tag,
};

/// IMAP protocol version served.
pub const IMAP_VERSION: &str = "IMAP4rev1";
