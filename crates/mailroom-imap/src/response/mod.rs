//! Server responses and their wire encoding.
//!
//! Every response the session produces is a [`Response`] value; the
//! connection encodes it with [`Response::encode`] just before writing.

mod envelope;

use chrono::{DateTime, FixedOffset};

pub use envelope::{Address, Envelope};

use crate::command::StatusAttribute;
use crate::types::{
    Capability, DELIMITER, Flag, ListEntry, Mailbox, ResponseCode, Status, Tag,
};

/// Format of INTERNALDATE, e.g. `17-Jul-1996 02:44:25 -0700`.
pub const INTERNAL_DATE_FORMAT: &str = "%d-%b-%Y %H:%M:%S %z";

/// One data item of a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchValue {
    /// `FLAGS (...)`
    Flags(Vec<Flag>),
    /// `UID n`
    Uid(u32),
    /// `INTERNALDATE "..."`
    InternalDate(DateTime<FixedOffset>),
    /// `RFC822.SIZE n`
    Rfc822Size(u32),
    /// `ENVELOPE (...)`
    Envelope(Box<Envelope>),
    /// Message content under its response name, e.g. `BODY[HEADER]` or
    /// `RFC822.TEXT`. Always sent as a literal.
    Section {
        /// Item name as echoed to the client.
        name: String,
        /// Content bytes.
        data: Vec<u8>,
    },
}

/// A server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Status response; untagged when `tag` is `None`.
    Status {
        /// Tag of the completed command.
        tag: Option<Tag>,
        /// OK, NO, BAD, PREAUTH or BYE.
        status: Status,
        /// Optional bracketed response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Continuation request (`+ text`).
    Continuation(String),
    /// `* CAPABILITY ...`
    Capability(Vec<Capability>),
    /// `* FLAGS (...)`
    Flags(Vec<Flag>),
    /// `* n EXISTS`
    Exists(u32),
    /// `* n RECENT`
    Recent(u32),
    /// `* n EXPUNGE`
    Expunge(u32),
    /// `* LIST` or `* LSUB`
    List {
        /// LSUB instead of LIST.
        lsub: bool,
        /// Mailbox and attributes.
        entry: ListEntry,
    },
    /// `* STATUS mailbox (...)`
    MailboxStatus {
        /// Mailbox name.
        mailbox: Mailbox,
        /// Requested items and their values.
        items: Vec<(StatusAttribute, u32)>,
    },
    /// `* SEARCH ...`
    Search(Vec<u32>),
    /// `* n FETCH (...)`
    Fetch {
        /// Sequence number.
        seq: u32,
        /// Data items.
        items: Vec<FetchValue>,
    },
}

impl Response {
    /// Tagged OK.
    #[must_use]
    pub fn ok(tag: &Tag, text: impl Into<String>) -> Self {
        Self::tagged(tag, Status::Ok, None, text)
    }

    /// Tagged NO.
    #[must_use]
    pub fn no(tag: &Tag, text: impl Into<String>) -> Self {
        Self::tagged(tag, Status::No, None, text)
    }

    /// Tagged BAD.
    #[must_use]
    pub fn bad(tag: &Tag, text: impl Into<String>) -> Self {
        Self::tagged(tag, Status::Bad, None, text)
    }

    /// Tagged status with an optional response code.
    #[must_use]
    pub fn tagged(
        tag: &Tag,
        status: Status,
        code: Option<ResponseCode>,
        text: impl Into<String>,
    ) -> Self {
        Self::Status {
            tag: Some(tag.clone()),
            status,
            code,
            text: text.into(),
        }
    }

    /// Untagged status.
    #[must_use]
    pub fn untagged(status: Status, code: Option<ResponseCode>, text: impl Into<String>) -> Self {
        Self::Status {
            tag: None,
            status,
            code,
            text: text.into(),
        }
    }

    /// Encodes the response, CRLF included.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::Status {
                tag,
                status,
                code,
                text,
            } => {
                match tag {
                    Some(tag) => out.extend_from_slice(tag.as_str().as_bytes()),
                    None => out.push(b'*'),
                }
                out.push(b' ');
                out.extend_from_slice(status.as_str().as_bytes());
                if let Some(code) = code {
                    out.extend_from_slice(format!(" [{code}]").as_bytes());
                }
                out.push(b' ');
                write_text(out, text);
            }
            Self::Continuation(text) => {
                out.extend_from_slice(b"+ ");
                write_text(out, text);
            }
            Self::Capability(caps) => {
                out.extend_from_slice(b"* CAPABILITY");
                for cap in caps {
                    out.extend_from_slice(format!(" {cap}").as_bytes());
                }
            }
            Self::Flags(flags) => {
                out.extend_from_slice(b"* FLAGS ");
                write_flags(out, flags);
            }
            Self::Exists(n) => out.extend_from_slice(format!("* {n} EXISTS").as_bytes()),
            Self::Recent(n) => out.extend_from_slice(format!("* {n} RECENT").as_bytes()),
            Self::Expunge(n) => out.extend_from_slice(format!("* {n} EXPUNGE").as_bytes()),
            Self::List { lsub, entry } => {
                out.extend_from_slice(if *lsub { b"* LSUB (" } else { b"* LIST (" });
                let attrs: Vec<_> = entry.attributes.iter().map(|a| a.as_str()).collect();
                out.extend_from_slice(attrs.join(" ").as_bytes());
                out.extend_from_slice(format!(") \"{DELIMITER}\" ").as_bytes());
                write_astring(out, entry.mailbox.as_str());
            }
            Self::MailboxStatus { mailbox, items } => {
                out.extend_from_slice(b"* STATUS ");
                write_astring(out, mailbox.as_str());
                let parts: Vec<_> = items
                    .iter()
                    .map(|(item, value)| format!("{} {value}", item.as_str()))
                    .collect();
                out.extend_from_slice(format!(" ({})", parts.join(" ")).as_bytes());
            }
            Self::Search(ids) => {
                out.extend_from_slice(b"* SEARCH");
                for id in ids {
                    out.extend_from_slice(format!(" {id}").as_bytes());
                }
            }
            Self::Fetch { seq, items } => {
                out.extend_from_slice(format!("* {seq} FETCH (").as_bytes());
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    item.encode(out);
                }
                out.push(b')');
            }
        }
        out.extend_from_slice(b"\r\n");
    }

    /// Encodes the response into a fresh buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}

impl FetchValue {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::Flags(flags) => {
                out.extend_from_slice(b"FLAGS ");
                write_flags(out, flags);
            }
            Self::Uid(uid) => out.extend_from_slice(format!("UID {uid}").as_bytes()),
            Self::InternalDate(date) => out.extend_from_slice(
                format!("INTERNALDATE \"{}\"", date.format(INTERNAL_DATE_FORMAT)).as_bytes(),
            ),
            Self::Rfc822Size(size) => out.extend_from_slice(format!("RFC822.SIZE {size}").as_bytes()),
            Self::Envelope(envelope) => {
                out.extend_from_slice(b"ENVELOPE ");
                envelope.encode(out);
            }
            Self::Section { name, data } => {
                out.extend_from_slice(name.as_bytes());
                out.push(b' ');
                write_literal(out, data);
            }
        }
    }
}

/// Writes response text, dropping bare CR and LF so it stays on one line.
fn write_text(out: &mut Vec<u8>, text: &str) {
    out.extend(text.bytes().filter(|&b| b != b'\r' && b != b'\n'));
}

fn write_flags(out: &mut Vec<u8>, flags: &[Flag]) {
    let names: Vec<_> = flags.iter().map(Flag::as_str).collect();
    out.extend_from_slice(format!("({})", names.join(" ")).as_bytes());
}

/// Writes an astring: an atom when possible, otherwise a string.
pub(crate) fn write_astring(out: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        write_string(out, s.as_bytes());
    } else {
        out.extend_from_slice(s.as_bytes());
    }
}

/// Writes a string or `NIL`.
pub(crate) fn write_nstring(out: &mut Vec<u8>, s: Option<&str>) {
    match s {
        Some(s) => write_string(out, s.as_bytes()),
        None => out.extend_from_slice(b"NIL"),
    }
}

/// Writes a quoted string, or a literal when quoting cannot carry the bytes.
pub(crate) fn write_string(out: &mut Vec<u8>, data: &[u8]) {
    if data.iter().all(|&b| (0x01..0x80).contains(&b) && b != b'\r' && b != b'\n') {
        out.push(b'"');
        for &b in data {
            if b == b'"' || b == b'\\' {
                out.push(b'\\');
            }
            out.push(b);
        }
        out.push(b'"');
    } else {
        write_literal(out, data);
    }
}

fn write_literal(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(format!("{{{}}}\r\n", data.len()).as_bytes());
    out.extend_from_slice(data);
}

/// Returns true if the byte cannot appear in an atom.
const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']'
    ) || b < 0x20
        || b >= 0x7F
}
