//! Listener configuration types.

use std::net::SocketAddr;
use std::time::Duration;

use crate::session::{DEFAULT_MAX_MESSAGE_SIZE, SessionConfig};

/// Longest accepted line, CRLF excluded.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Role of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Plaintext MX port (25); STARTTLS when a certificate exists, no
    /// AUTH before it.
    #[default]
    Relay,
    /// Submission port (587); STARTTLS, AUTH allowed before the upgrade.
    Submission,
    /// TLS from the first byte (port 465).
    Implicit,
}

impl Mode {
    /// Returns the default port for this mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Relay => 25,
            Self::Submission => 587,
            Self::Implicit => 465,
        }
    }

    /// Returns true if this mode cannot run without a certificate.
    #[must_use]
    pub const fn requires_tls(self) -> bool {
        matches!(self, Self::Submission | Self::Implicit)
    }
}

/// SMTP listener configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind.
    pub bind_addr: SocketAddr,
    /// Listener role.
    pub mode: Mode,
    /// Name announced to clients.
    pub hostname: String,
    /// Local mail domain.
    pub domain: String,
    /// Largest message accepted.
    pub max_message_size: usize,
    /// Longest accepted line.
    pub max_line: usize,
    /// How long a connection may stay silent before it is closed.
    pub idle_timeout: Duration,
}

impl Config {
    /// Creates a configuration with the default limits.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        mode: Mode,
        hostname: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            bind_addr,
            mode,
            hostname: hostname.into(),
            domain: domain.into(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_line: MAX_LINE_LENGTH,
            idle_timeout: Duration::from_secs(5 * 60),
        }
    }

    /// Sets the message size cap.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub const fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Builds the session settings for this listener.
    #[must_use]
    pub fn session_config(&self, tls_available: bool) -> SessionConfig {
        SessionConfig::new(self.hostname.clone(), self.domain.clone())
            .with_max_message_size(self.max_message_size)
            .with_insecure_auth(self.mode == Mode::Submission)
            .with_starttls(tls_available && self.mode != Mode::Implicit)
    }
}
