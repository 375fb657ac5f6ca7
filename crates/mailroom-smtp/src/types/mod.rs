//! Core SMTP types.

mod address;
mod envelope;
mod extension;
mod reply;

pub use address::{Address, parse_path};
pub use envelope::{Direction, Envelope};
pub use extension::{AuthMechanism, Extension};
pub use reply::{Reply, ReplyCode};
