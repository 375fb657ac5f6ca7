//! Message flags and the STORE flag engine.

/// A flag name as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Message has been read.
    Seen,
    /// Message has been answered.
    Answered,
    /// Message is flagged for special attention.
    Flagged,
    /// Message is marked for deletion.
    Deleted,
    /// Message is a draft.
    Draft,
    /// Message is recent (first session to see it).
    Recent,
    /// Keyword or unknown system flag, kept verbatim.
    Keyword(String),
}

impl Flag {
    /// Parses a flag string.
    ///
    /// System flags are matched case-insensitively; anything else is kept
    /// as a keyword with its original spelling.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "\\SEEN" => Self::Seen,
            "\\ANSWERED" => Self::Answered,
            "\\FLAGGED" => Self::Flagged,
            "\\DELETED" => Self::Deleted,
            "\\DRAFT" => Self::Draft,
            "\\RECENT" => Self::Recent,
            _ => Self::Keyword(s.to_string()),
        }
    }

    /// Returns the flag as an IMAP string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Seen => "\\Seen",
            Self::Answered => "\\Answered",
            Self::Flagged => "\\Flagged",
            Self::Deleted => "\\Deleted",
            Self::Draft => "\\Draft",
            Self::Recent => "\\Recent",
            Self::Keyword(s) => s,
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The five per-message booleans the mailbox store persists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FlagSet {
    /// `\Seen`
    pub read: bool,
    /// `\Flagged`
    pub saved: bool,
    /// `\Deleted`
    pub deleted: bool,
    /// `\Draft`
    pub draft: bool,
    /// `\Answered`
    pub answered: bool,
}

impl FlagSet {
    /// Builds a set where exactly the named system flags are true.
    #[must_use]
    pub fn from_flags<'a>(flags: impl IntoIterator<Item = &'a Flag>) -> Self {
        let mut set = Self::default();
        for flag in flags {
            set.assign(flag, true);
        }
        set
    }

    /// Sets the boolean backing `flag`. Flags without a backing boolean are ignored.
    fn assign(&mut self, flag: &Flag, value: bool) {
        match flag {
            Flag::Seen => self.read = value,
            Flag::Flagged => self.saved = value,
            Flag::Deleted => self.deleted = value,
            Flag::Draft => self.draft = value,
            Flag::Answered => self.answered = value,
            Flag::Recent | Flag::Keyword(_) => {}
        }
    }

    /// Returns the wire flags for the booleans that are set, in a stable order.
    #[must_use]
    pub fn to_flags(self) -> Vec<Flag> {
        let mut out = Vec::with_capacity(5);
        if self.read {
            out.push(Flag::Seen);
        }
        if self.answered {
            out.push(Flag::Answered);
        }
        if self.saved {
            out.push(Flag::Flagged);
        }
        if self.deleted {
            out.push(Flag::Deleted);
        }
        if self.draft {
            out.push(Flag::Draft);
        }
        out
    }

    /// Returns true if `flag` is set. Keywords and `\Recent` are never set.
    #[must_use]
    pub fn contains(self, flag: &Flag) -> bool {
        match flag {
            Flag::Seen => self.read,
            Flag::Flagged => self.saved,
            Flag::Deleted => self.deleted,
            Flag::Draft => self.draft,
            Flag::Answered => self.answered,
            Flag::Recent | Flag::Keyword(_) => false,
        }
    }
}

/// How a STORE changes the flags of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// `FLAGS`: replace.
    Replace,
    /// `+FLAGS`: add.
    Add,
    /// `-FLAGS`: remove.
    Remove,
}

impl StoreMode {
    /// Returns the wire keyword without the `.SILENT` suffix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "FLAGS",
            Self::Add => "+FLAGS",
            Self::Remove => "-FLAGS",
        }
    }
}

/// A parsed STORE data item name such as `+FLAGS.SILENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOperation {
    /// Replace, add or remove.
    pub mode: StoreMode,
    /// Suppress the untagged FETCH responses.
    pub silent: bool,
}

impl StoreOperation {
    /// Parses `FLAGS`, `+FLAGS`, `-FLAGS` with an optional `.SILENT` suffix,
    /// case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_ascii_uppercase();
        let (name, silent) = match upper.strip_suffix(".SILENT") {
            Some(name) => (name, true),
            None => (upper.as_str(), false),
        };
        let mode = match name {
            "FLAGS" => StoreMode::Replace,
            "+FLAGS" => StoreMode::Add,
            "-FLAGS" => StoreMode::Remove,
            _ => return None,
        };
        Some(Self { mode, silent })
    }

    /// Applies this operation to `current`. `silent` has no effect here.
    #[must_use]
    pub fn apply(self, names: &[Flag], current: FlagSet) -> FlagSet {
        apply(self.mode, names, current)
    }
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mode.as_str())?;
        if self.silent {
            f.write_str(".SILENT")?;
        }
        Ok(())
    }
}

/// Computes the flag set that results from a STORE.
///
/// Replace sets exactly the named flags. Add and remove only touch the
/// named flags and leave every other boolean as it was.
#[must_use]
pub fn apply(mode: StoreMode, names: &[Flag], current: FlagSet) -> FlagSet {
    match mode {
        StoreMode::Replace => FlagSet::from_flags(names),
        StoreMode::Add | StoreMode::Remove => {
            let value = mode == StoreMode::Add;
            let mut next = current;
            for flag in names {
                next.assign(flag, value);
            }
            next
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn all_set() -> FlagSet {
        FlagSet {
            read: true,
            saved: true,
            deleted: true,
            draft: true,
            answered: true,
        }
    }

    mod flag_tests {
        use super::*;

        #[test]
        fn parse_system_flags_case_insensitive() {
            assert_eq!(Flag::parse("\\Seen"), Flag::Seen);
            assert_eq!(Flag::parse("\\SEEN"), Flag::Seen);
            assert_eq!(Flag::parse("\\flagged"), Flag::Flagged);
            assert_eq!(Flag::parse("\\Deleted"), Flag::Deleted);
            assert_eq!(Flag::parse("\\Draft"), Flag::Draft);
            assert_eq!(Flag::parse("\\Answered"), Flag::Answered);
        }

        #[test]
        fn unknown_names_pass_through() {
            assert_eq!(
                Flag::parse("$Important"),
                Flag::Keyword("$Important".to_string())
            );
            assert_eq!(Flag::parse("\\Junk").as_str(), "\\Junk");
        }
    }

    mod engine_tests {
        use super::*;

        #[test]
        fn replace_with_empty_list_clears_everything() {
            assert_eq!(
                apply(StoreMode::Replace, &[], all_set()),
                FlagSet::default()
            );
        }

        #[test]
        fn replace_sets_only_named() {
            let next = apply(StoreMode::Replace, &[Flag::Seen], all_set());
            assert_eq!(
                next,
                FlagSet {
                    read: true,
                    ..FlagSet::default()
                }
            );
        }

        #[test]
        fn add_seen_never_touches_deleted() {
            let deleted = FlagSet {
                deleted: true,
                ..FlagSet::default()
            };
            let next = apply(StoreMode::Add, &[Flag::Seen], deleted);
            assert!(next.deleted);
            assert!(next.read);

            let next = apply(StoreMode::Add, &[Flag::Seen], FlagSet::default());
            assert!(!next.deleted);
        }

        #[test]
        fn remove_deleted_keeps_read() {
            let current = FlagSet {
                read: true,
                deleted: true,
                ..FlagSet::default()
            };
            let next = apply(StoreMode::Remove, &[Flag::Deleted], current);
            assert!(!next.deleted);
            assert!(next.read);
        }

        #[test]
        fn keywords_have_no_effect() {
            let next = apply(
                StoreMode::Replace,
                &[Flag::Keyword("$Junk".into()), Flag::Recent],
                all_set(),
            );
            assert_eq!(next, FlagSet::default());
        }

        #[test]
        fn round_trip_through_wire_flags() {
            let set = FlagSet {
                read: true,
                draft: true,
                ..FlagSet::default()
            };
            assert_eq!(FlagSet::from_flags(&set.to_flags()), set);
        }
    }

    mod operation_tests {
        use super::*;

        #[test]
        fn parse_plain_and_silent() {
            assert_eq!(
                StoreOperation::parse("FLAGS"),
                Some(StoreOperation {
                    mode: StoreMode::Replace,
                    silent: false
                })
            );
            assert_eq!(
                StoreOperation::parse("+flags.silent"),
                Some(StoreOperation {
                    mode: StoreMode::Add,
                    silent: true
                })
            );
            assert_eq!(
                StoreOperation::parse("-FLAGS.SILENT").unwrap().mode,
                StoreMode::Remove
            );
        }

        #[test]
        fn parse_rejects_other_items() {
            assert!(StoreOperation::parse("FLAG").is_none());
            assert!(StoreOperation::parse("+FLAGS.LOUD").is_none());
            assert!(StoreOperation::parse("*FLAGS").is_none());
        }

        #[test]
        fn silent_does_not_change_result() {
            let loud = StoreOperation::parse("+FLAGS").unwrap();
            let quiet = StoreOperation::parse("+FLAGS.SILENT").unwrap();
            let current = FlagSet {
                saved: true,
                ..FlagSet::default()
            };
            assert_eq!(
                loud.apply(&[Flag::Seen], current),
                quiet.apply(&[Flag::Seen], current)
            );
        }

        #[test]
        fn display() {
            assert_eq!(
                StoreOperation::parse("-flags.silent").unwrap().to_string(),
                "-FLAGS.SILENT"
            );
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn flag_set() -> impl Strategy<Value = FlagSet> {
            any::<[bool; 5]>().prop_map(|[read, saved, deleted, draft, answered]| FlagSet {
                read,
                saved,
                deleted,
                draft,
                answered,
            })
        }

        fn flag_names() -> impl Strategy<Value = Vec<Flag>> {
            proptest::collection::vec(
                prop_oneof![
                    Just(Flag::Seen),
                    Just(Flag::Flagged),
                    Just(Flag::Deleted),
                    Just(Flag::Draft),
                    Just(Flag::Answered),
                    "[a-z]{1,8}".prop_map(Flag::Keyword),
                ],
                0..6,
            )
        }

        proptest! {
            #[test]
            fn replace_ignores_current(names in flag_names(), a in flag_set(), b in flag_set()) {
                prop_assert_eq!(
                    apply(StoreMode::Replace, &names, a),
                    apply(StoreMode::Replace, &names, b)
                );
            }

            #[test]
            fn add_never_clears(names in flag_names(), current in flag_set()) {
                let next = apply(StoreMode::Add, &names, current);
                prop_assert!(!current.read || next.read);
                prop_assert!(!current.saved || next.saved);
                prop_assert!(!current.deleted || next.deleted);
                prop_assert!(!current.draft || next.draft);
                prop_assert!(!current.answered || next.answered);
            }

            #[test]
            fn remove_only_touches_named(current in flag_set()) {
                let next = apply(StoreMode::Remove, &[Flag::Deleted], current);
                prop_assert!(!next.deleted);
                prop_assert_eq!(next, FlagSet { deleted: false, ..current });
            }

            #[test]
            fn keywords_have_no_effect(word in "[a-z]{1,8}", current in flag_set()) {
                let names = [Flag::Keyword(word)];
                prop_assert_eq!(apply(StoreMode::Add, &names, current), current);
                prop_assert_eq!(apply(StoreMode::Remove, &names, current), current);
            }
        }
    }
}
