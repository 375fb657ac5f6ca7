//! Core IMAP types.
//!
//! Flags, mailbox names, sequence sets, identifiers and response codes
//! shared by the parser, the session and the response encoder.

#![allow(clippy::missing_const_for_fn)]

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod response_code;
mod sequence;

pub use capability::{Capability, Status};
pub use flags::{Flag, FlagSet, StoreMode, StoreOperation, apply};
pub use identifiers::{Tag, Uid, UidValidity};
pub use mailbox::{
    DELIMITER, ListEntry, Mailbox, MailboxAttribute, MailboxStatus, list_matches,
};
pub use response_code::ResponseCode;
pub use sequence::{SeqBound, SeqRange, SequenceSet};
