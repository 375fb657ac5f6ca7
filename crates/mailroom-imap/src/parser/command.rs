//! Command grammar.
//!
//! Turns one framed command into a [`TaggedCommand`]. Failures carry the
//! tag whenever it was readable so the session can answer with a tagged
//! `BAD`.

use std::iter::Peekable;
use std::slice::Iter;

use super::item::{Item, MAX_DEPTH, scan};
use crate::command::{
    Command, CopyArgs, FetchArgs, SearchArgs, SearchCriteria, StatusAttribute, StoreArgs,
    TaggedCommand, UidCommand,
};
use crate::error::ParseError;
use crate::types::{Flag, Mailbox, SequenceSet, StoreOperation, Tag};

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parses a complete command (without its final CRLF).
///
/// # Errors
///
/// Returns a [`ParseError`] if the tag, keyword or arguments violate the
/// command grammar. The error's `tag` is set whenever the tag was valid.
pub fn parse_command(input: &[u8]) -> ParseResult<TaggedCommand> {
    let (tag, rest) = split_word(input);
    if tag.is_empty() {
        return Err(ParseError::untagged("Missing tag"));
    }
    let tag = std::str::from_utf8(tag)
        .ok()
        .filter(|t| Tag::is_valid(t))
        .map(Tag::new)
        .ok_or_else(|| ParseError::untagged("Invalid tag"))?;

    let (keyword, rest) = split_word(rest);
    if keyword.is_empty() {
        return Err(ParseError::tagged(tag, "Missing command"));
    }
    let keyword = String::from_utf8_lossy(keyword).to_ascii_uppercase();

    let items = match scan(rest) {
        Ok(items) => items,
        Err(err) => return Err(ParseError::tagged(tag, err.to_string())),
    };

    let mut args = Args::new(&tag, &items);
    let command = parse_keyword(&keyword, &mut args)?;
    args.finish()?;

    Ok(TaggedCommand { tag, command })
}

fn parse_keyword(keyword: &str, args: &mut Args<'_>) -> ParseResult<Command> {
    let command = match keyword {
        "CAPABILITY" => Command::Capability,
        "NOOP" => Command::Noop,
        "LOGOUT" => Command::Logout,
        "CHECK" => Command::Check,
        "CLOSE" => Command::Close,
        "EXPUNGE" => Command::Expunge,
        "LOGIN" => Command::Login {
            username: args.astring("username")?,
            password: args.astring("password")?,
        },
        "AUTHENTICATE" => Command::Authenticate {
            mechanism: args.atom("authentication mechanism")?.to_string(),
            initial_response: args.optional_atom()?,
        },
        "SELECT" => Command::Select {
            mailbox: args.mailbox()?,
        },
        "EXAMINE" => Command::Examine {
            mailbox: args.mailbox()?,
        },
        "CREATE" => Command::Create {
            mailbox: args.mailbox()?,
        },
        "DELETE" => Command::Delete {
            mailbox: args.mailbox()?,
        },
        "RENAME" => Command::Rename {
            from: args.mailbox()?,
            to: args.mailbox()?,
        },
        "SUBSCRIBE" => Command::Subscribe {
            mailbox: args.mailbox()?,
        },
        "UNSUBSCRIBE" => Command::Unsubscribe {
            mailbox: args.mailbox()?,
        },
        "LIST" => Command::List {
            reference: args.astring("reference")?,
            pattern: args.astring("mailbox pattern")?,
        },
        "LSUB" => Command::Lsub {
            reference: args.astring("reference")?,
            pattern: args.astring("mailbox pattern")?,
        },
        "STATUS" => parse_status(args)?,
        "APPEND" => parse_append(args)?,
        "SEARCH" => Command::Search(parse_search(args)?),
        "FETCH" => Command::Fetch(parse_fetch(args)?),
        "STORE" => Command::Store(parse_store(args)?),
        "COPY" => Command::Copy(parse_copy(args)?),
        "UID" => {
            let sub = args.atom("UID command")?.to_ascii_uppercase();
            Command::Uid(match sub.as_str() {
                "FETCH" => UidCommand::Fetch(parse_fetch(args)?),
                "SEARCH" => UidCommand::Search(parse_search(args)?),
                "STORE" => UidCommand::Store(parse_store(args)?),
                "COPY" => UidCommand::Copy(parse_copy(args)?),
                _ => return Err(args.error(format!("Unsupported UID command: {sub}"))),
            })
        }
        _ => return Err(args.error(format!("Unknown command: {keyword}"))),
    };
    Ok(command)
}

fn parse_status(args: &mut Args<'_>) -> ParseResult<Command> {
    let mailbox = args.mailbox()?;
    let list = args.list("status items")?;
    let items = list
        .iter()
        .map(|item| {
            item.as_atom()
                .and_then(StatusAttribute::parse)
                .ok_or_else(|| args.error(format!("Unknown STATUS item: {}", describe(item))))
        })
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Command::Status { mailbox, items })
}

fn parse_append(args: &mut Args<'_>) -> ParseResult<Command> {
    let mailbox = args.mailbox()?;

    let flags = match args.peek() {
        Some(Item::List(list)) => {
            let flags = flag_list(args, list)?;
            args.next("flags")?;
            Some(flags)
        }
        _ => None,
    };

    let date = match args.peek() {
        Some(Item::Quoted(date)) => {
            let date = date.clone();
            args.next("date")?;
            Some(date)
        }
        _ => None,
    };

    let message = match args.next("message literal")? {
        Item::Literal(bytes) => bytes.clone(),
        other => return Err(args.error(format!("Expected message literal, got {}", describe(other)))),
    };

    Ok(Command::Append {
        mailbox,
        flags,
        date,
        message,
    })
}

fn parse_fetch(args: &mut Args<'_>) -> ParseResult<FetchArgs> {
    let sequence = args.sequence()?;
    let items = match args.next("fetch items")? {
        Item::Atom(name) => vec![name.clone()],
        Item::List(list) if !list.is_empty() => list
            .iter()
            .map(|item| {
                item.as_atom()
                    .map(str::to_string)
                    .ok_or_else(|| args.error(format!("Invalid fetch item: {}", describe(item))))
            })
            .collect::<ParseResult<Vec<_>>>()?,
        other => return Err(args.error(format!("Invalid fetch items: {}", describe(other)))),
    };
    Ok(FetchArgs { sequence, items })
}

fn parse_store(args: &mut Args<'_>) -> ParseResult<StoreArgs> {
    let sequence = args.sequence()?;
    let name = args.atom("store operation")?;
    let operation = StoreOperation::parse(name)
        .ok_or_else(|| args.error(format!("Invalid store operation: {name}")))?;

    let flags = match args.peek() {
        Some(Item::List(list)) => {
            let flags = flag_list(args, list)?;
            args.next("flags")?;
            flags
        }
        Some(_) => {
            let mut flags = Vec::new();
            while args.peek().is_some() {
                flags.push(Flag::parse(args.atom("flag")?));
            }
            flags
        }
        None => return Err(args.error("Missing flag list")),
    };

    Ok(StoreArgs {
        sequence,
        operation,
        flags,
    })
}

fn parse_copy(args: &mut Args<'_>) -> ParseResult<CopyArgs> {
    Ok(CopyArgs {
        sequence: args.sequence()?,
        mailbox: args.mailbox()?,
    })
}

fn parse_search(args: &mut Args<'_>) -> ParseResult<SearchArgs> {
    let charset = match args.peek().and_then(Item::as_atom) {
        Some(word) if word.eq_ignore_ascii_case("CHARSET") => {
            args.next("CHARSET")?;
            Some(args.astring("charset")?)
        }
        _ => None,
    };

    let mut criteria = Vec::new();
    while args.peek().is_some() {
        criteria.push(search_key(args, 0)?);
    }
    if criteria.is_empty() {
        return Err(args.error("Missing search criteria"));
    }
    Ok(SearchArgs { charset, criteria })
}

fn search_key(args: &mut Args<'_>, depth: usize) -> ParseResult<SearchCriteria> {
    if depth > MAX_DEPTH {
        return Err(args.error("Search criteria nested too deeply"));
    }
    let item = args.next("search key")?;
    let word = match item {
        Item::Atom(word) => word.to_ascii_uppercase(),
        Item::List(list) => {
            let mut inner = Args::new(args.tag, list);
            let mut keys = Vec::new();
            while inner.peek().is_some() {
                keys.push(search_key(&mut inner, depth + 1)?);
            }
            if keys.is_empty() {
                return Err(args.error("Empty search group"));
            }
            return Ok(SearchCriteria::And(keys));
        }
        other => {
            let raw = other
                .as_astring()
                .ok_or_else(|| args.error("Invalid search key"))?;
            return Ok(SearchCriteria::Bare(raw));
        }
    };

    let key = match word.as_str() {
        "ALL" => SearchCriteria::All,
        "ANSWERED" => SearchCriteria::Answered,
        "DELETED" => SearchCriteria::Deleted,
        "DRAFT" => SearchCriteria::Draft,
        "FLAGGED" => SearchCriteria::Flagged,
        "NEW" => SearchCriteria::New,
        "SEEN" => SearchCriteria::Seen,
        "UNANSWERED" => SearchCriteria::Unanswered,
        "UNDELETED" => SearchCriteria::Undeleted,
        "UNDRAFT" => SearchCriteria::Undraft,
        "UNFLAGGED" => SearchCriteria::Unflagged,
        "UNSEEN" => SearchCriteria::Unseen,
        "SUBJECT" => SearchCriteria::Subject(args.astring("SUBJECT text")?),
        "FROM" => SearchCriteria::From(args.astring("FROM text")?),
        "TO" => SearchCriteria::To(args.astring("TO text")?),
        "CC" => SearchCriteria::Cc(args.astring("CC text")?),
        "BODY" => SearchCriteria::Body(args.astring("BODY text")?),
        "TEXT" => SearchCriteria::Text(args.astring("TEXT text")?),
        "UID" => SearchCriteria::Uid(args.sequence()?),
        "LARGER" => SearchCriteria::Larger(args.number("LARGER size")?),
        "SMALLER" => SearchCriteria::Smaller(args.number("SMALLER size")?),
        "NOT" => SearchCriteria::Not(Box::new(search_key(args, depth + 1)?)),
        "OR" => {
            let left = search_key(args, depth + 1)?;
            let right = search_key(args, depth + 1)?;
            SearchCriteria::Or(Box::new(left), Box::new(right))
        }
        _ => match item {
            Item::Atom(raw) => SearchCriteria::Bare(raw.clone()),
            _ => return Err(args.error("Invalid search key")),
        },
    };
    Ok(key)
}

fn flag_list(args: &Args<'_>, list: &[Item]) -> ParseResult<Vec<Flag>> {
    list.iter()
        .map(|item| {
            item.as_atom()
                .map(Flag::parse)
                .ok_or_else(|| args.error(format!("Invalid flag: {}", describe(item))))
        })
        .collect()
}

/// Splits off the first space-delimited word.
fn split_word(input: &[u8]) -> (&[u8], &[u8]) {
    match input.iter().position(|&b| b == b' ') {
        Some(pos) => (&input[..pos], &input[pos + 1..]),
        None => (input, &[]),
    }
}

fn describe(item: &Item) -> String {
    match item {
        Item::Atom(s) => s.clone(),
        Item::Quoted(s) => format!("\"{s}\""),
        Item::Literal(bytes) => format!("{{{}}}", bytes.len()),
        Item::List(_) => "(...)".to_string(),
    }
}

/// Cursor over a command's arguments.
struct Args<'a> {
    tag: &'a Tag,
    items: Peekable<Iter<'a, Item>>,
}

impl<'a> Args<'a> {
    fn new(tag: &'a Tag, items: &'a [Item]) -> Self {
        Self {
            tag,
            items: items.iter().peekable(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> ParseError {
        ParseError::tagged(self.tag.clone(), reason)
    }

    fn peek(&mut self) -> Option<&'a Item> {
        self.items.peek().copied()
    }

    fn next(&mut self, what: &str) -> ParseResult<&'a Item> {
        self.items
            .next()
            .ok_or_else(|| self.error(format!("Missing {what}")))
    }

    fn astring(&mut self, what: &str) -> ParseResult<String> {
        let item = self.next(what)?;
        item.as_astring()
            .ok_or_else(|| self.error(format!("Invalid {what}: {}", describe(item))))
    }

    fn atom(&mut self, what: &str) -> ParseResult<&'a str> {
        let item = self.next(what)?;
        item.as_atom()
            .ok_or_else(|| self.error(format!("Invalid {what}: {}", describe(item))))
    }

    fn optional_atom(&mut self) -> ParseResult<Option<String>> {
        if self.peek().is_none() {
            return Ok(None);
        }
        self.atom("initial response").map(|s| Some(s.to_string()))
    }

    fn mailbox(&mut self) -> ParseResult<Mailbox> {
        self.astring("mailbox name").map(Mailbox::new)
    }

    fn list(&mut self, what: &str) -> ParseResult<&'a [Item]> {
        let item = self.next(what)?;
        item.as_list()
            .ok_or_else(|| self.error(format!("Expected parenthesized {what}")))
    }

    fn sequence(&mut self) -> ParseResult<SequenceSet> {
        let raw = self.atom("sequence set")?;
        SequenceSet::parse(raw).ok_or_else(|| self.error(format!("Invalid sequence set: {raw}")))
    }

    fn number(&mut self, what: &str) -> ParseResult<u32> {
        let raw = self.atom(what)?;
        raw.parse()
            .map_err(|_| self.error(format!("Invalid {what}: {raw}")))
    }

    fn finish(mut self) -> ParseResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(item) => Err(self.error(format!("Unexpected argument: {}", describe(item)))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::{SeqBound, SeqRange, StoreMode};

    fn parse(input: &[u8]) -> Command {
        parse_command(input).unwrap().command
    }

    fn fails(input: &[u8]) -> ParseError {
        parse_command(input).unwrap_err()
    }

    mod framing_tests {
        use super::*;

        #[test]
        fn tag_is_preserved() {
            let parsed = parse_command(b"a.B-9 NOOP").unwrap();
            assert_eq!(parsed.tag.as_str(), "a.B-9");
            assert_eq!(parsed.command, Command::Noop);
        }

        #[test]
        fn keyword_is_case_insensitive() {
            assert_eq!(parse(b"x capability"), Command::Capability);
            assert_eq!(parse(b"x LogOut"), Command::Logout);
        }

        #[test]
        fn missing_keyword_keeps_tag() {
            let err = fails(b"A1");
            assert_eq!(err.tag, Some(Tag::new("A1")));
        }

        #[test]
        fn unknown_keyword_keeps_tag() {
            let err = fails(b"A2 FROB x");
            assert_eq!(err.tag, Some(Tag::new("A2")));
            assert!(err.reason.contains("FROB"));
        }

        #[test]
        fn unreadable_tag_is_untagged() {
            assert_eq!(fails(b"").tag, None);
            assert_eq!(fails(b"* NOOP").tag, None);
            assert_eq!(fails(b"+ NOOP").tag, None);
        }

        #[test]
        fn scanner_errors_keep_tag() {
            let err = fails(b"A3 SELECT \"unterminated");
            assert_eq!(err.tag, Some(Tag::new("A3")));
            let err = fails(b"A4 STATUS INBOX (MESSAGES");
            assert_eq!(err.tag, Some(Tag::new("A4")));
        }

        #[test]
        fn extra_arguments_fail() {
            assert!(parse_command(b"A1 NOOP now").is_err());
            assert!(parse_command(b"A1 SELECT INBOX Sent").is_err());
        }
    }

    mod auth_tests {
        use super::*;

        #[test]
        fn login_atoms_and_quoted() {
            assert_eq!(
                parse(b"A1 LOGIN alice \"pa ss\""),
                Command::Login {
                    username: "alice".into(),
                    password: "pa ss".into()
                }
            );
        }

        #[test]
        fn login_literal_password() {
            assert_eq!(
                parse(b"A1 LOGIN alice {6}\r\nsecret"),
                Command::Login {
                    username: "alice".into(),
                    password: "secret".into()
                }
            );
        }

        #[test]
        fn login_missing_password_fails() {
            let err = fails(b"A1 LOGIN alice");
            assert_eq!(err.tag, Some(Tag::new("A1")));
        }

        #[test]
        fn authenticate_preserves_mechanism_case() {
            assert_eq!(
                parse(b"A1 AUTHENTICATE plain"),
                Command::Authenticate {
                    mechanism: "plain".into(),
                    initial_response: None
                }
            );
        }

        #[test]
        fn authenticate_initial_response_is_opaque() {
            assert_eq!(
                parse(b"A1 AUTHENTICATE PLAIN AGFsaWNlAHNlY3JldA=="),
                Command::Authenticate {
                    mechanism: "PLAIN".into(),
                    initial_response: Some("AGFsaWNlAHNlY3JldA==".into())
                }
            );
        }

        #[test]
        fn authenticate_missing_mechanism_fails() {
            assert!(parse_command(b"A1 AUTHENTICATE").is_err());
        }
    }

    mod mailbox_tests {
        use super::*;

        #[test]
        fn quoted_names_with_spaces_round_trip() {
            for (input, name) in [
                (&b"A SELECT \"My Folder\""[..], "My Folder"),
                (b"A CREATE \"Work/Q1 Reports\"", "Work/Q1 Reports"),
                (b"A DELETE \"Old Stuff\"", "Old Stuff"),
                (b"A SUBSCRIBE \"a b/c d\"", "a b/c d"),
            ] {
                let mailbox = match parse(input) {
                    Command::Select { mailbox }
                    | Command::Create { mailbox }
                    | Command::Delete { mailbox }
                    | Command::Subscribe { mailbox } => mailbox,
                    other => panic!("unexpected {other:?}"),
                };
                assert_eq!(mailbox.as_str(), name);
            }
        }

        #[test]
        fn hierarchical_names_are_opaque() {
            assert_eq!(
                parse(b"A CREATE Archive/2024/March"),
                Command::Create {
                    mailbox: Mailbox::new("Archive/2024/March")
                }
            );
        }

        #[test]
        fn examine_parses_like_select() {
            assert_eq!(
                parse(b"A EXAMINE inbox"),
                Command::Examine {
                    mailbox: Mailbox::inbox()
                }
            );
        }

        #[test]
        fn rename_needs_two_names() {
            assert_eq!(
                parse(b"A RENAME Old \"New Name\""),
                Command::Rename {
                    from: Mailbox::new("Old"),
                    to: Mailbox::new("New Name")
                }
            );
            assert!(parse_command(b"A RENAME Old").is_err());
        }

        #[test]
        fn list_empty_reference_is_legal() {
            assert_eq!(
                parse(b"A LIST \"\" *"),
                Command::List {
                    reference: String::new(),
                    pattern: "*".into()
                }
            );
            assert_eq!(
                parse(b"A LSUB \"\" \"Work/%\""),
                Command::Lsub {
                    reference: String::new(),
                    pattern: "Work/%".into()
                }
            );
        }

        #[test]
        fn list_absent_reference_fails() {
            assert!(parse_command(b"A LIST *").is_err());
            assert!(parse_command(b"A LIST").is_err());
        }

        #[test]
        fn unsubscribe_single_operand() {
            assert_eq!(
                parse(b"A UNSUBSCRIBE Sent"),
                Command::Unsubscribe {
                    mailbox: Mailbox::new("Sent")
                }
            );
        }
    }

    mod status_tests {
        use super::*;

        #[test]
        fn items_normalise_case() {
            let lower = parse(b"A STATUS INBOX (messages unseen uidnext)");
            let upper = parse(b"A STATUS INBOX (MESSAGES UNSEEN UIDNEXT)");
            assert_eq!(lower, upper);
            assert_eq!(
                upper,
                Command::Status {
                    mailbox: Mailbox::inbox(),
                    items: vec![
                        StatusAttribute::Messages,
                        StatusAttribute::Unseen,
                        StatusAttribute::UidNext
                    ]
                }
            );
        }

        #[test]
        fn unknown_item_fails() {
            let err = fails(b"A STATUS INBOX (MESSAGES SIZE)");
            assert!(err.reason.contains("SIZE"));
        }

        #[test]
        fn parentheses_are_mandatory() {
            assert!(parse_command(b"A STATUS INBOX MESSAGES").is_err());
            assert!(parse_command(b"A STATUS INBOX").is_err());
        }
    }

    mod append_tests {
        use super::*;

        #[test]
        fn append_with_flags_and_literal() {
            assert_eq!(
                parse(b"A001 APPEND INBOX (\\Seen \\Flagged) {5}\r\nHello"),
                Command::Append {
                    mailbox: Mailbox::inbox(),
                    flags: Some(vec![Flag::Seen, Flag::Flagged]),
                    date: None,
                    message: b"Hello".to_vec(),
                }
            );
        }

        #[test]
        fn append_without_flags_leaves_them_unset() {
            match parse(b"A APPEND Drafts {2}\r\nhi") {
                Command::Append { flags, .. } => assert_eq!(flags, None),
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn append_empty_flags_is_empty_list() {
            match parse(b"A APPEND Drafts () {2}\r\nhi") {
                Command::Append { flags, .. } => assert_eq!(flags, Some(vec![])),
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn append_with_date() {
            match parse(b"A APPEND Sent (\\Seen) \"17-Jul-1996 02:44:25 -0700\" {1}\r\nx") {
                Command::Append { date, message, .. } => {
                    assert_eq!(date.as_deref(), Some("17-Jul-1996 02:44:25 -0700"));
                    assert_eq!(message, b"x");
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn append_zero_length_literal() {
            match parse(b"A APPEND INBOX {0}\r\n") {
                Command::Append { message, .. } => assert!(message.is_empty()),
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn append_binary_content_is_exact() {
            let mut input = b"A APPEND INBOX {6}\r\n".to_vec();
            input.extend_from_slice(b"\x00\xff\r\n)\x80");
            match parse(&input) {
                Command::Append { message, .. } => assert_eq!(message, b"\x00\xff\r\n)\x80"),
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn append_requires_literal() {
            assert!(parse_command(b"A APPEND INBOX (\\Seen)").is_err());
            assert!(parse_command(b"A APPEND INBOX \"not a literal\"").is_err());
        }
    }

    mod message_tests {
        use super::*;

        fn value(n: u32) -> SeqBound {
            SeqBound::Value(std::num::NonZeroU32::new(n).unwrap())
        }

        #[test]
        fn fetch_items_are_verbatim() {
            assert_eq!(
                parse(b"A FETCH 1:* (FLAGS BODY.PEEK[HEADER.FIELDS (From)] x-unknown)"),
                Command::Fetch(FetchArgs {
                    sequence: SequenceSet::parse("1:*").unwrap(),
                    items: vec![
                        "FLAGS".into(),
                        "BODY.PEEK[HEADER.FIELDS (From)]".into(),
                        "x-unknown".into()
                    ],
                })
            );
        }

        #[test]
        fn fetch_single_macro() {
            assert_eq!(
                parse(b"A FETCH 2 ALL"),
                Command::Fetch(FetchArgs {
                    sequence: SequenceSet::single(2).unwrap(),
                    items: vec!["ALL".into()],
                })
            );
        }

        #[test]
        fn fetch_bad_sequence_fails() {
            assert!(parse_command(b"A FETCH 0 FLAGS").is_err());
            assert!(parse_command(b"A FETCH x FLAGS").is_err());
            assert!(parse_command(b"A FETCH 1 ()").is_err());
        }

        #[test]
        fn uid_store_silent() {
            let parsed = parse_command(b"1.1 UID STORE 1 +FLAGS.SILENT (\\Seen)").unwrap();
            assert_eq!(parsed.tag.as_str(), "1.1");
            let Command::Uid(UidCommand::Store(store)) = parsed.command else {
                panic!("expected UID STORE");
            };
            assert_eq!(store.sequence.ranges(), &[SeqRange::single(value(1))]);
            assert_eq!(store.operation.mode, StoreMode::Add);
            assert!(store.operation.silent);
            assert_eq!(store.flags, vec![Flag::Seen]);
        }

        #[test]
        fn store_replace_with_empty_list() {
            let Command::Store(store) = parse(b"A STORE 2:4 FLAGS ()") else {
                panic!("expected STORE");
            };
            assert_eq!(store.operation.mode, StoreMode::Replace);
            assert!(store.flags.is_empty());
        }

        #[test]
        fn store_keeps_unknown_flags() {
            let Command::Store(store) = parse(b"A STORE 1 -FLAGS ($Junk \\Deleted)") else {
                panic!("expected STORE");
            };
            assert_eq!(
                store.flags,
                vec![Flag::Keyword("$Junk".into()), Flag::Deleted]
            );
        }

        #[test]
        fn store_bad_operation_fails() {
            assert!(parse_command(b"A STORE 1 FLAG (\\Seen)").is_err());
            assert!(parse_command(b"A STORE 1 +FLAGS").is_err());
        }

        #[test]
        fn copy_and_uid_copy() {
            let expected = CopyArgs {
                sequence: SequenceSet::parse("2,4").unwrap(),
                mailbox: Mailbox::new("Saved Mail"),
            };
            assert_eq!(
                parse(b"A COPY 2,4 \"Saved Mail\""),
                Command::Copy(expected.clone())
            );
            assert_eq!(
                parse(b"A uid copy 2,4 \"Saved Mail\""),
                Command::Uid(UidCommand::Copy(expected))
            );
        }

        #[test]
        fn uid_rejects_other_commands() {
            let err = fails(b"A UID EXPUNGE 1:3");
            assert_eq!(err.tag, Some(Tag::new("A")));
        }
    }

    mod search_tests {
        use super::*;

        fn criteria(input: &[u8]) -> Vec<SearchCriteria> {
            match parse(input) {
                Command::Search(args) | Command::Uid(UidCommand::Search(args)) => args.criteria,
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn id_list_is_bare_criterion() {
            assert_eq!(
                criteria(b"A SEARCH 1,577,5084"),
                vec![SearchCriteria::Bare("1,577,5084".into())]
            );
        }

        #[test]
        fn text_key_differs_from_bare_operand() {
            assert_eq!(
                criteria(b"A SEARCH TEXT 2024"),
                vec![SearchCriteria::Text("2024".into())]
            );
            assert_eq!(criteria(b"A SEARCH 2024"), vec![SearchCriteria::Bare("2024".into())]);
        }

        #[test]
        fn deep_nesting_is_a_tagged_error() {
            let mut line = b"A1 SEARCH ".to_vec();
            line.extend(b"NOT ".repeat(200_000));
            line.extend_from_slice(b"ALL");
            let err = fails(&line);
            assert_eq!(err.tag, Some(Tag::new("A1")));

            let mut line = b"A2 NOOP ".to_vec();
            line.extend(b"(".repeat(300_000));
            line.extend(b")".repeat(300_000));
            assert_eq!(fails(&line).tag, Some(Tag::new("A2")));

            let nested = format!("A3 SEARCH {}ALL", "NOT ".repeat(MAX_DEPTH));
            assert!(parse_command(nested.as_bytes()).is_ok());
        }

        #[test]
        fn flag_keys() {
            assert_eq!(
                criteria(b"A SEARCH unseen FLAGGED"),
                vec![SearchCriteria::Unseen, SearchCriteria::Flagged]
            );
        }

        #[test]
        fn keys_with_operands() {
            assert_eq!(
                criteria(b"A UID SEARCH SUBJECT \"hello world\" UID 5:*"),
                vec![
                    SearchCriteria::Subject("hello world".into()),
                    SearchCriteria::Uid(SequenceSet::parse("5:*").unwrap())
                ]
            );
        }

        #[test]
        fn boolean_combinators() {
            assert_eq!(
                criteria(b"A SEARCH OR SEEN NOT FROM bob (DELETED DRAFT)"),
                vec![
                    SearchCriteria::Or(
                        Box::new(SearchCriteria::Seen),
                        Box::new(SearchCriteria::Not(Box::new(SearchCriteria::From(
                            "bob".into()
                        ))))
                    ),
                    SearchCriteria::And(vec![SearchCriteria::Deleted, SearchCriteria::Draft]),
                ]
            );
        }

        #[test]
        fn charset_is_captured() {
            match parse(b"A SEARCH CHARSET UTF-8 TEXT caf\xc3\xa9") {
                Command::Search(args) => {
                    assert_eq!(args.charset.as_deref(), Some("UTF-8"));
                    assert_eq!(args.criteria, vec![SearchCriteria::Text("café".into())]);
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn missing_operand_or_criteria_fails() {
            assert!(parse_command(b"A SEARCH").is_err());
            assert!(parse_command(b"A SEARCH SUBJECT").is_err());
            assert!(parse_command(b"A SEARCH OR SEEN").is_err());
            assert!(parse_command(b"A SEARCH LARGER big").is_err());
        }
    }
}
