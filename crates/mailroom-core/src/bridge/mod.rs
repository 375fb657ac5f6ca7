//! The backend both protocol engines call.
//!
//! [`Mailroom`] implements [`mailroom_imap::Backend`] and
//! [`mailroom_smtp::Backend`] on top of a [`MailboxStore`], a [`UserStore`]
//! and a [`Relay`]. The protocol crates never see the collaborators
//! directly.

mod imap;
mod smtp;

use std::sync::Arc;

use crate::account::{User, check_login};
use crate::relay::Relay;
use crate::store::{MailboxStore, MemoryStore, UserStore};
use crate::Result;

/// Sender identity used when the reverse path is empty.
pub const FALLBACK_SENDER: &str = "admin";

/// Mailbox that receives a copy of every relayed message.
pub const SENT_MAILBOX: &str = "Sent";

/// Mail server backend over the storage and relay collaborators.
#[derive(Clone)]
pub struct Mailroom {
    mail: Arc<dyn MailboxStore>,
    users: Arc<dyn UserStore>,
    relay: Arc<dyn Relay>,
    domain: String,
}

impl std::fmt::Debug for Mailroom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailroom")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl Mailroom {
    /// Creates a backend for the local `domain`.
    #[must_use]
    pub fn new(
        mail: Arc<dyn MailboxStore>,
        users: Arc<dyn UserStore>,
        relay: Arc<dyn Relay>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            mail,
            users,
            relay,
            domain: domain.into(),
        }
    }

    /// Creates a backend whose mail and users both live in `store`.
    #[must_use]
    pub fn with_memory_store(
        store: Arc<MemoryStore>,
        relay: Arc<dyn Relay>,
        domain: impl Into<String>,
    ) -> Self {
        Self::new(store.clone(), store, relay, domain)
    }

    /// Returns the local mail domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    async fn login(&self, username: &str, password: &str) -> Result<Option<User>> {
        check_login(&*self.users, username, password).await
    }
}
