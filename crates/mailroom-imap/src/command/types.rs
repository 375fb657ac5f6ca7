//! Command-related type definitions.

use crate::types::{Flag, Mailbox, SequenceSet, StoreOperation};

/// STATUS data items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusAttribute {
    /// Number of messages.
    Messages,
    /// Number of recent messages.
    Recent,
    /// Next UID.
    UidNext,
    /// UIDVALIDITY.
    UidValidity,
    /// Number of unseen messages.
    Unseen,
}

impl StatusAttribute {
    /// Parses a STATUS item name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MESSAGES" => Some(Self::Messages),
            "RECENT" => Some(Self::Recent),
            "UIDNEXT" => Some(Self::UidNext),
            "UIDVALIDITY" => Some(Self::UidValidity),
            "UNSEEN" => Some(Self::Unseen),
            _ => None,
        }
    }

    /// Returns the upper-case item name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "MESSAGES",
            Self::Recent => "RECENT",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
            Self::Unseen => "UNSEEN",
        }
    }
}

/// SEARCH criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// All messages.
    All,
    /// Messages with \Answered flag.
    Answered,
    /// Messages with \Deleted flag.
    Deleted,
    /// Messages with \Draft flag.
    Draft,
    /// Messages with \Flagged flag.
    Flagged,
    /// Recent messages without \Seen.
    New,
    /// Messages with \Seen flag.
    Seen,
    /// Messages without \Answered flag.
    Unanswered,
    /// Messages without \Deleted flag.
    Undeleted,
    /// Messages without \Draft flag.
    Undraft,
    /// Messages without \Flagged flag.
    Unflagged,
    /// Messages without \Seen flag.
    Unseen,
    /// Messages whose UID is in the set.
    Uid(SequenceSet),
    /// Subject contains text.
    Subject(String),
    /// From contains text.
    From(String),
    /// To contains text.
    To(String),
    /// Cc contains text.
    Cc(String),
    /// Body contains text.
    Body(String),
    /// Text in header or body.
    Text(String),
    /// Operand the grammar does not recognise, kept verbatim.
    ///
    /// A comma list of ids lands here; it is read as a sequence set when
    /// it is one and as [`SearchCriteria::Text`] otherwise.
    Bare(String),
    /// Larger than size.
    Larger(u32),
    /// Smaller than size.
    Smaller(u32),
    /// AND of criteria.
    And(Vec<Self>),
    /// OR of criteria.
    Or(Box<Self>, Box<Self>),
    /// NOT of criteria.
    Not(Box<Self>),
}

/// Arguments of FETCH and UID FETCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchArgs {
    /// Messages to fetch.
    pub sequence: SequenceSet,
    /// Data item names exactly as the client wrote them.
    pub items: Vec<String>,
}

/// Arguments of SEARCH and UID SEARCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchArgs {
    /// Optional CHARSET argument.
    pub charset: Option<String>,
    /// Criteria; a message matches when every one matches.
    pub criteria: Vec<SearchCriteria>,
}

/// Arguments of STORE and UID STORE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreArgs {
    /// Messages to change.
    pub sequence: SequenceSet,
    /// Replace, add or remove, and whether to stay silent.
    pub operation: StoreOperation,
    /// Flag names from the wire; unknown names are kept.
    pub flags: Vec<Flag>,
}

/// Arguments of COPY and UID COPY.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyArgs {
    /// Messages to copy.
    pub sequence: SequenceSet,
    /// Destination mailbox.
    pub mailbox: Mailbox,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_items_parse_any_case() {
        assert_eq!(StatusAttribute::parse("messages"), Some(StatusAttribute::Messages));
        assert_eq!(StatusAttribute::parse("UidNext"), Some(StatusAttribute::UidNext));
        assert_eq!(StatusAttribute::parse("HIGHESTMODSEQ"), None);
    }

    #[test]
    fn status_items_print_upper_case() {
        assert_eq!(StatusAttribute::parse("unseen").map(StatusAttribute::as_str), Some("UNSEEN"));
    }
}
