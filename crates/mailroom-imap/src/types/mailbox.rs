//! Mailbox types.

/// Hierarchy delimiter used for every mailbox name.
pub const DELIMITER: char = '/';

/// Mailbox name.
///
/// Names are case-preserving, except `INBOX` which is matched
/// case-insensitively and always stored in upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Mailbox(pub String);

impl Mailbox {
    /// Creates a new mailbox name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.eq_ignore_ascii_case("INBOX") {
            Self::inbox()
        } else {
            Self(name)
        }
    }

    /// The INBOX mailbox.
    #[must_use]
    pub fn inbox() -> Self {
        Self("INBOX".to_string())
    }

    /// Returns true if this is INBOX.
    #[must_use]
    pub fn is_inbox(&self) -> bool {
        self.0 == "INBOX"
    }

    /// Returns the mailbox name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the parent name, if the mailbox is nested.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once(DELIMITER)
            .map(|(parent, _)| Self::new(parent))
            .filter(|p| !p.0.is_empty())
    }

    /// Returns true if `self` is a strict descendant of `ancestor`.
    #[must_use]
    pub fn is_child_of(&self, ancestor: &Self) -> bool {
        self.0
            .strip_prefix(ancestor.as_str())
            .is_some_and(|rest| rest.starts_with(DELIMITER))
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Mailbox {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Counters reported by SELECT, EXAMINE and STATUS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// Number of messages without `\Seen`.
    pub unseen: u32,
    /// Next UID to be assigned.
    pub uid_next: u32,
    /// UIDVALIDITY value.
    pub uid_validity: u32,
}

/// Mailbox attributes reported in LIST responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// Mailbox cannot be selected.
    NoSelect,
    /// Mailbox has no children.
    HasNoChildren,
    /// Mailbox has children.
    HasChildren,
    /// Mailbox is the drafts folder.
    Drafts,
    /// Mailbox is the sent folder.
    Sent,
    /// Mailbox is the trash folder.
    Trash,
    /// Mailbox is the junk/spam folder.
    Junk,
}

impl MailboxAttribute {
    /// Returns the attribute as it appears on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoSelect => "\\Noselect",
            Self::HasNoChildren => "\\HasNoChildren",
            Self::HasChildren => "\\HasChildren",
            Self::Drafts => "\\Drafts",
            Self::Sent => "\\Sent",
            Self::Trash => "\\Trash",
            Self::Junk => "\\Junk",
        }
    }

    /// Special-use attribute implied by a well-known top-level name.
    #[must_use]
    pub fn special_use(mailbox: &Mailbox) -> Option<Self> {
        match mailbox.as_str() {
            "Drafts" => Some(Self::Drafts),
            "Sent" => Some(Self::Sent),
            "Trash" => Some(Self::Trash),
            "Junk" | "Spam" => Some(Self::Junk),
            _ => None,
        }
    }
}

/// One LIST/LSUB result line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Mailbox attributes.
    pub attributes: Vec<MailboxAttribute>,
    /// Mailbox name.
    pub mailbox: Mailbox,
}

/// Matches a mailbox name against a LIST reference and pattern.
///
/// `*` matches any run of characters, `%` the same but stops at the
/// hierarchy delimiter. `INBOX` matches case-insensitively.
#[must_use]
pub fn list_matches(reference: &str, pattern: &str, name: &Mailbox) -> bool {
    let full = format!("{reference}{pattern}");
    let full = if full.len() >= 5 && full[..5].eq_ignore_ascii_case("INBOX") {
        let rest = &full[5..];
        if rest.is_empty() || rest.starts_with(DELIMITER) {
            format!("INBOX{rest}")
        } else {
            full
        }
    } else {
        full
    };
    wildcard_match(full.as_bytes(), name.as_str().as_bytes())
}

fn wildcard_match(pattern: &[u8], name: &[u8]) -> bool {
    match pattern.split_first() {
        None => name.is_empty(),
        Some((b'*', rest)) => (0..=name.len()).any(|i| wildcard_match(rest, &name[i..])),
        Some((b'%', rest)) => {
            let stop = name
                .iter()
                .position(|&b| b == DELIMITER as u8)
                .unwrap_or(name.len());
            (0..=stop).any(|i| wildcard_match(rest, &name[i..]))
        }
        Some((&c, rest)) => name
            .split_first()
            .is_some_and(|(&n, tail)| n == c && wildcard_match(rest, tail)),
    }
}
