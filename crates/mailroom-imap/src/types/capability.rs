//! Server capabilities and response status.

/// Status of a tagged or untagged status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Returns the status keyword as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bad => "BAD",
            Self::PreAuth => "PREAUTH",
            Self::Bye => "BYE",
        }
    }

    /// Returns true if this is a successful status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A capability the server advertises.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// LITERAL+ extension (RFC 7888)
    LiteralPlus,
    /// SPECIAL-USE mailboxes (RFC 6154)
    SpecialUse,
    /// STARTTLS support
    StartTls,
    /// LOGIN disabled
    LoginDisabled,
    /// AUTH mechanism
    Auth(String),
}

impl Capability {
    /// Capabilities advertised to a client.
    ///
    /// `AUTH=PLAIN` is only offered once the client has something to
    /// authenticate; after login it is dropped.
    #[must_use]
    pub fn advertised(authenticated: bool) -> Vec<Self> {
        let mut caps = vec![Self::Imap4Rev1, Self::LiteralPlus, Self::SpecialUse];
        if !authenticated {
            caps.push(Self::Auth("PLAIN".to_string()));
        }
        caps
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::LiteralPlus => write!(f, "LITERAL+"),
            Self::SpecialUse => write!(f, "SPECIAL-USE"),
            Self::StartTls => write!(f, "STARTTLS"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_keywords() {
        assert_eq!(Status::Ok.to_string(), "OK");
        assert_eq!(Status::Bad.as_str(), "BAD");
        assert!(!Status::No.is_ok());
        assert!(Status::PreAuth.is_ok());
    }

    #[test]
    fn advertised_before_login_offers_plain() {
        let caps = Capability::advertised(false);
        assert_eq!(caps[0], Capability::Imap4Rev1);
        assert!(caps.contains(&Capability::Auth("PLAIN".into())));
    }

    #[test]
    fn advertised_after_login_drops_auth() {
        let caps = Capability::advertised(true);
        assert!(!caps.iter().any(|c| matches!(c, Capability::Auth(_))));
    }

    #[test]
    fn display() {
        assert_eq!(Capability::Auth("PLAIN".into()).to_string(), "AUTH=PLAIN");
        assert_eq!(Capability::LiteralPlus.to_string(), "LITERAL+");
    }
}
