//! # mailroom-mime
//!
//! MIME parsing for messages arriving over SMTP DATA or IMAP APPEND.
//!
//! ## Features
//!
//! - **Headers**: folding, case-insensitive lookup, RFC 2047 encoded words
//! - **Transfer encodings**: 7bit/8bit/binary, base64, quoted-printable
//! - **Multipart**: nested trees, boundary from `Content-Type`
//! - **Summary**: subject, addresses, date, text/html bodies, attachments
//!
//! ## Quick Start
//!
//! ```
//! use mailroom_mime::Message;
//!
//! let raw = b"From: Ann <ann@example.com>\r\n\
//!             Subject: =?utf-8?B?SMOpbGxv?=\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let mail = Message::parse(raw).summary();
//! assert_eq!(mail.subject.as_deref(), Some("Héllo"));
//! assert_eq!(mail.from[0].address, "ann@example.com");
//! assert_eq!(mail.html_or_text(), Some("Hello, World!"));
//! ```
//!
//! Parsing never fails. Broken structure degrades to leaves holding raw
//! bytes, so a malformed message can still be stored.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod content_type;
mod error;
mod header;
mod message;
mod summary;

pub mod encoding;

pub use address::{MailAddress, parse_address_list};
pub use content_type::{ContentDisposition, ContentType};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
pub use summary::{Attachment, ParsedMail, parse_date};
