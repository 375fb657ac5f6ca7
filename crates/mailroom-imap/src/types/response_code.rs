//! Response codes.

use super::{Capability, Flag, UidValidity};

/// Response code attached to a status response, written as `[CODE args]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: Human-readable message that MUST be shown to user.
    Alert,
    /// CAPABILITY response.
    Capability(Vec<Capability>),
    /// PERMANENTFLAGS: Flags that can be changed permanently.
    PermanentFlags(Vec<Flag>),
    /// READ-ONLY: Mailbox selected as read-only.
    ReadOnly,
    /// READ-WRITE: Mailbox selected as read-write.
    ReadWrite,
    /// TRYCREATE: Mailbox doesn't exist, but can be created.
    TryCreate,
    /// UIDNEXT: Next UID to be assigned.
    UidNext(u32),
    /// UIDVALIDITY: Unique identifier validity value.
    UidValidity(UidValidity),
    /// UNSEEN: First unseen message sequence number.
    Unseen(u32),
    /// AUTHENTICATIONFAILED (RFC 5530).
    AuthenticationFailed,
    /// NONEXISTENT (RFC 5530).
    Nonexistent,
    /// TOOBIG (RFC 7888): a literal exceeded the server limit.
    TooBig,
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alert => f.write_str("ALERT"),
            Self::Capability(caps) => {
                f.write_str("CAPABILITY")?;
                for cap in caps {
                    write!(f, " {cap}")?;
                }
                Ok(())
            }
            Self::PermanentFlags(flags) => {
                let names: Vec<_> = flags.iter().map(Flag::as_str).collect();
                write!(f, "PERMANENTFLAGS ({})", names.join(" "))
            }
            Self::ReadOnly => f.write_str("READ-ONLY"),
            Self::ReadWrite => f.write_str("READ-WRITE"),
            Self::TryCreate => f.write_str("TRYCREATE"),
            Self::UidNext(n) => write!(f, "UIDNEXT {n}"),
            Self::UidValidity(v) => write!(f, "UIDVALIDITY {v}"),
            Self::Unseen(n) => write!(f, "UNSEEN {n}"),
            Self::AuthenticationFailed => f.write_str("AUTHENTICATIONFAILED"),
            Self::Nonexistent => f.write_str("NONEXISTENT"),
            Self::TooBig => f.write_str("TOOBIG"),
        }
    }
}
