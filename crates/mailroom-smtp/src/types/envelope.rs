//! Transaction envelope handed to the backend after DATA.

use super::Address;

/// Which way a transaction flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Mail for local users from anywhere; no authentication needed.
    Incoming,
    /// Mail from an authenticated user's own address, relayed to remote
    /// recipients and delivered to local ones.
    Outgoing,
}

/// Envelope of one completed mail transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Flow chosen at `MAIL FROM`.
    pub direction: Direction,
    /// Reverse path; `None` for the null path `<>`.
    pub from: Option<Address>,
    /// Accepted forward paths, in `RCPT TO` order.
    pub recipients: Vec<Address>,
    /// Authenticated user, if any.
    pub user: Option<String>,
}

impl Envelope {
    /// Returns the recipients joined with `", "`.
    #[must_use]
    pub fn joined_recipients(&self) -> String {
        self.recipients
            .iter()
            .map(Address::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
