//! User model types.

use serde::{Deserialize, Serialize};

/// A registered mailbox owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Canonical id; the lower-cased username.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Primary address, `username@domain`.
    pub email: String,
    /// Argon2 PHC string, salt included.
    pub password_hash: String,
}

impl User {
    /// Returns the display form used in `From` headers.
    #[must_use]
    pub fn mailbox_address(&self) -> String {
        format!("{} <{}>", self.username, self.email)
    }
}

/// How to find a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserQuery<'a> {
    /// By login name, case-insensitively.
    Username(&'a str),
    /// By primary address, case-insensitively.
    Email(&'a str),
}

/// A user to register, as read from the seed file or the command line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    /// Primary address; `username@domain` when omitted.
    #[serde(default)]
    pub email: Option<String>,
    /// Clear-text password, hashed before it is stored.
    pub password: String,
}

impl NewUser {
    /// Creates a user entry.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            password: password.into(),
        }
    }

    /// Returns the address to register under `domain`.
    #[must_use]
    pub fn email_in(&self, domain: &str) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| format!("{}@{domain}", self.username))
    }
}

/// Parses a JSON seed file: an array of [`NewUser`] objects.
///
/// # Errors
///
/// Returns an error if the JSON does not match.
pub fn parse_seed(json: &str) -> crate::Result<Vec<NewUser>> {
    Ok(serde_json::from_str(json)?)
}
