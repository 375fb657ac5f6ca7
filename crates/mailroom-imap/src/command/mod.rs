//! Client commands.
//!
//! A [`Command`] is produced whole by [`crate::parser::parse_command`] or
//! not at all; every variant carries exactly the fields its grammar
//! defines.

mod types;

use crate::types::{Flag, Mailbox, Tag};

pub use types::{
    CopyArgs, FetchArgs, SearchArgs, SearchCriteria, StatusAttribute, StoreArgs,
};

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Any State Commands
    /// CAPABILITY command.
    Capability,
    /// NOOP command.
    Noop,
    /// LOGOUT command.
    Logout,

    // Not Authenticated State Commands
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// AUTHENTICATE command.
    Authenticate {
        /// Authentication mechanism, case preserved.
        mechanism: String,
        /// Initial response (optional), passed through unexamined.
        initial_response: Option<String>,
    },

    // Authenticated State Commands
    /// SELECT command.
    Select {
        /// Mailbox to select.
        mailbox: Mailbox,
    },
    /// EXAMINE command (read-only SELECT).
    Examine {
        /// Mailbox to examine.
        mailbox: Mailbox,
    },
    /// CREATE command.
    Create {
        /// Mailbox to create.
        mailbox: Mailbox,
    },
    /// DELETE command.
    Delete {
        /// Mailbox to delete.
        mailbox: Mailbox,
    },
    /// RENAME command.
    Rename {
        /// Current mailbox name.
        from: Mailbox,
        /// New mailbox name.
        to: Mailbox,
    },
    /// SUBSCRIBE command.
    Subscribe {
        /// Mailbox to subscribe.
        mailbox: Mailbox,
    },
    /// UNSUBSCRIBE command.
    Unsubscribe {
        /// Mailbox to unsubscribe.
        mailbox: Mailbox,
    },
    /// LIST command.
    List {
        /// Reference name; may be empty.
        reference: String,
        /// Mailbox pattern, wildcards unexpanded.
        pattern: String,
    },
    /// LSUB command.
    Lsub {
        /// Reference name; may be empty.
        reference: String,
        /// Mailbox pattern, wildcards unexpanded.
        pattern: String,
    },
    /// STATUS command.
    Status {
        /// Mailbox name.
        mailbox: Mailbox,
        /// Status items requested.
        items: Vec<StatusAttribute>,
    },
    /// APPEND command.
    Append {
        /// Target mailbox.
        mailbox: Mailbox,
        /// Flags to set; `None` when no list was given.
        flags: Option<Vec<Flag>>,
        /// Internal date as written by the client.
        date: Option<String>,
        /// Message data, exactly the declared literal size.
        message: Vec<u8>,
    },

    // Selected State Commands
    /// CHECK command.
    Check,
    /// CLOSE command.
    Close,
    /// EXPUNGE command.
    Expunge,
    /// SEARCH command.
    Search(SearchArgs),
    /// FETCH command.
    Fetch(FetchArgs),
    /// STORE command.
    Store(StoreArgs),
    /// COPY command.
    Copy(CopyArgs),
    /// UID-prefixed command.
    Uid(UidCommand),
}

/// Commands that may follow `UID`.
///
/// The wrapped arguments are identical to the plain command; only their
/// interpretation as UIDs differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidCommand {
    /// UID FETCH.
    Fetch(FetchArgs),
    /// UID SEARCH.
    Search(SearchArgs),
    /// UID STORE.
    Store(StoreArgs),
    /// UID COPY.
    Copy(CopyArgs),
}

impl Command {
    /// Returns the command keyword, for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Noop => "NOOP",
            Self::Logout => "LOGOUT",
            Self::Login { .. } => "LOGIN",
            Self::Authenticate { .. } => "AUTHENTICATE",
            Self::Select { .. } => "SELECT",
            Self::Examine { .. } => "EXAMINE",
            Self::Create { .. } => "CREATE",
            Self::Delete { .. } => "DELETE",
            Self::Rename { .. } => "RENAME",
            Self::Subscribe { .. } => "SUBSCRIBE",
            Self::Unsubscribe { .. } => "UNSUBSCRIBE",
            Self::List { .. } => "LIST",
            Self::Lsub { .. } => "LSUB",
            Self::Status { .. } => "STATUS",
            Self::Append { .. } => "APPEND",
            Self::Check => "CHECK",
            Self::Close => "CLOSE",
            Self::Expunge => "EXPUNGE",
            Self::Search(_) => "SEARCH",
            Self::Fetch(_) => "FETCH",
            Self::Store(_) => "STORE",
            Self::Copy(_) => "COPY",
            Self::Uid(UidCommand::Fetch(_)) => "UID FETCH",
            Self::Uid(UidCommand::Search(_)) => "UID SEARCH",
            Self::Uid(UidCommand::Store(_)) => "UID STORE",
            Self::Uid(UidCommand::Copy(_)) => "UID COPY",
        }
    }
}

/// A command together with the tag the client gave it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedCommand {
    /// Client tag, echoed in the completion response.
    pub tag: Tag,
    /// The command.
    pub command: Command,
}
