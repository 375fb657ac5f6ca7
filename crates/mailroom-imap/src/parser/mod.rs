//! IMAP command parser.
//!
//! Sans-I/O parsing of client commands, in three layers:
//!
//! - **Framer**: assembles complete commands from transport bytes and
//!   reports when a literal continuation is needed
//! - **Lexer**: tokenizes one command into atoms, quoted strings,
//!   parentheses and literals
//! - **Grammar**: per-command rules producing a [`TaggedCommand`]
//!
//! # Example
//!
//! ```
//! use mailroom_imap::parser::parse_command;
//! use mailroom_imap::Command;
//!
//! let parsed = parse_command(b"A001 SELECT \"My Folder\"").unwrap();
//! assert_eq!(parsed.tag.as_str(), "A001");
//! assert!(matches!(parsed.command, Command::Select { .. }));
//! ```
//!
//! [`TaggedCommand`]: crate::command::TaggedCommand

mod command;
mod framer;
mod item;
pub mod lexer;

pub use command::parse_command;
pub use framer::{CommandFramer, Frame, MAX_LINE_LENGTH, MAX_LITERAL_SIZE};
pub use item::{Item, scan};
pub use lexer::{Lexer, Token};
