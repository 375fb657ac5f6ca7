//! Session state types.
//!
//! This module defines the states an IMAP session can be in,
//! following RFC 3501 section 3, and which commands each state accepts.

use crate::command::Command;
use crate::types::Mailbox;

/// Session state as defined by RFC 3501.
///
/// The IMAP protocol has four states:
/// - `NotAuthenticated`: Initial state, only authentication commands allowed
/// - `Authenticated`: User is authenticated, can select mailboxes
/// - `Selected`: A mailbox is selected, can manipulate messages
/// - `Logout`: Connection is being closed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not authenticated - waiting for credentials.
    ///
    /// In this state, only these commands are valid:
    /// - CAPABILITY
    /// - NOOP
    /// - LOGOUT
    /// - AUTHENTICATE
    /// - LOGIN
    #[default]
    NotAuthenticated,

    /// Authenticated - user has logged in.
    ///
    /// In this state, these additional commands are valid:
    /// - SELECT
    /// - EXAMINE
    /// - CREATE
    /// - DELETE
    /// - RENAME
    /// - SUBSCRIBE
    /// - UNSUBSCRIBE
    /// - LIST
    /// - LSUB
    /// - STATUS
    /// - APPEND
    Authenticated,

    /// Selected - a mailbox is currently open.
    ///
    /// In this state, all authenticated commands are valid plus:
    /// - CHECK
    /// - CLOSE
    /// - EXPUNGE
    /// - SEARCH
    /// - FETCH
    /// - STORE
    /// - COPY
    /// - UID (prefix)
    Selected(SelectedState),

    /// Logout - connection is being closed.
    Logout,
}

impl SessionState {
    /// Returns `true` if we're authenticated (authenticated or selected).
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Selected(_))
    }

    /// Returns `true` if a mailbox is selected.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        matches!(self, Self::Selected(_))
    }

    /// Returns the selected mailbox, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<&SelectedState> {
        match self {
            Self::Selected(state) => Some(state),
            _ => None,
        }
    }

    /// Returns `true` if the selected mailbox is read-only.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        match self {
            Self::Selected(state) => state.read_only,
            _ => false,
        }
    }

    /// Checks whether `command` is legal in this state.
    ///
    /// # Errors
    ///
    /// Returns the text for a tagged `NO` when it is not.
    pub fn permits(&self, command: &Command) -> Result<(), &'static str> {
        let allowed = match command {
            Command::Capability | Command::Noop | Command::Logout => true,
            Command::Login { .. } | Command::Authenticate { .. } => {
                return if self.is_authenticated() {
                    Err("Already authenticated")
                } else {
                    Ok(())
                };
            }
            Command::Select { .. }
            | Command::Examine { .. }
            | Command::Create { .. }
            | Command::Delete { .. }
            | Command::Rename { .. }
            | Command::Subscribe { .. }
            | Command::Unsubscribe { .. }
            | Command::List { .. }
            | Command::Lsub { .. }
            | Command::Status { .. }
            | Command::Append { .. } => self.is_authenticated(),
            Command::Check
            | Command::Close
            | Command::Expunge
            | Command::Search(_)
            | Command::Fetch(_)
            | Command::Store(_)
            | Command::Copy(_)
            | Command::Uid(_) => {
                return if self.is_selected() {
                    Ok(())
                } else if self.is_authenticated() {
                    Err("No mailbox selected")
                } else {
                    Err("Not authenticated")
                };
            }
        };
        if allowed {
            Ok(())
        } else {
            Err("Not authenticated")
        }
    }
}

/// State information when a mailbox is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedState {
    /// The selected mailbox.
    pub mailbox: Mailbox,
    /// Whether the mailbox is read-only (EXAMINE vs SELECT).
    pub read_only: bool,
}
