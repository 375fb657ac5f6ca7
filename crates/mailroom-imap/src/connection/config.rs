//! Listener configuration types.

use std::net::SocketAddr;
use std::time::Duration;

use crate::parser::{MAX_LINE_LENGTH, MAX_LITERAL_SIZE};

/// Transport security of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Plaintext (port 143).
    #[default]
    None,
    /// TLS from the first byte (port 993).
    Implicit,
}

impl Security {
    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 143,
            Self::Implicit => 993,
        }
    }
}

/// IMAP listener configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind.
    pub bind_addr: SocketAddr,
    /// Security mode.
    pub security: Security,
    /// Longest accepted command line.
    pub max_line: usize,
    /// Largest accepted literal.
    pub max_literal: usize,
    /// How long a connection may stay silent before it is closed.
    pub idle_timeout: Duration,
}

impl Config {
    /// Creates a configuration with the default limits.
    #[must_use]
    pub const fn new(bind_addr: SocketAddr, security: Security) -> Self {
        Self {
            bind_addr,
            security,
            max_line: MAX_LINE_LENGTH,
            max_literal: MAX_LITERAL_SIZE,
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }

    /// Sets the framing limits.
    #[must_use]
    pub const fn with_limits(mut self, max_line: usize, max_literal: usize) -> Self {
        self.max_line = max_line;
        self.max_literal = max_literal;
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub const fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}
