//! # mailroom-core
//!
//! Everything the protocol engines need from the rest of the server.
//!
//! This crate provides:
//! - **Storage seams**: [`MailboxStore`] and [`UserStore`], plus the
//!   in-process [`MemoryStore`]
//! - **Accounts**: users, Argon2 password hashes, seed-file parsing
//! - **Relay**: [`Relay`] with the JSON [`HttpRelay`] and the no-op
//!   [`NullRelay`]
//! - **Bridge**: [`Mailroom`], the backend handed to both the IMAP and the
//!   SMTP listeners
//! - **Startup helpers**: [`Config`] and TLS acceptor loading
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mailroom_core::{Mailroom, MemoryStore, NewUser, NullRelay};
//!
//! # async fn run() -> mailroom_core::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! store.add_user(&NewUser::new("alice", "secret"), "example.com").await?;
//! let backend = Mailroom::with_memory_store(store, Arc::new(NullRelay), "example.com");
//! assert_eq!(backend.domain(), "example.com");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
mod bridge;
pub mod config;
mod error;
pub mod relay;
pub mod store;
pub mod tls;

pub use account::{NewUser, User, UserQuery, check_login, hash_password, verify_password};
pub use bridge::{FALLBACK_SENDER, Mailroom, SENT_MAILBOX};
pub use config::{Config, Ports};
pub use error::{Error, Result};
pub use relay::{DeliveryReceipt, HttpRelay, MailDataToSend, NullRelay, Relay};
pub use store::{
    HeaderOptions, Mail, MailBodyData, MailHeaderData, MailId, MailboxState, MailboxStore,
    MemoryStore, UserStore,
};
pub use tls::{load_acceptor, optional_acceptor};
