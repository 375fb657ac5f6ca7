//! Per-listener session settings.

/// Default cap on a message body (25 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 25 * 1024 * 1024;

/// Most recipients accepted in one transaction.
pub const MAX_RECIPIENTS: usize = 100;

/// Settings shared by every session of one listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Name announced in the greeting and EHLO reply.
    pub hostname: String,
    /// Local mail domain; decides incoming versus outgoing.
    pub domain: String,
    /// Largest message accepted by DATA, in bytes.
    pub max_message_size: usize,
    /// Allow AUTH before the stream is encrypted.
    pub allow_insecure_auth: bool,
    /// Offer STARTTLS on plain streams.
    pub starttls: bool,
}

impl SessionConfig {
    /// Creates settings with TLS upgrades off and plaintext AUTH refused.
    #[must_use]
    pub fn new(hostname: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            domain: domain.into(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            allow_insecure_auth: false,
            starttls: false,
        }
    }

    /// Sets the message size cap.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Allows AUTH on a plain stream.
    #[must_use]
    pub const fn with_insecure_auth(mut self, allow: bool) -> Self {
        self.allow_insecure_auth = allow;
        self
    }

    /// Offers STARTTLS.
    #[must_use]
    pub const fn with_starttls(mut self, offer: bool) -> Self {
        self.starttls = offer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::new("mx.example.com", "example.com");
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
        assert!(!config.allow_insecure_auth);
        assert!(!config.starttls);

        let config = config.with_insecure_auth(true).with_starttls(true).with_max_message_size(10);
        assert!(config.allow_insecure_auth && config.starttls);
        assert_eq!(config.max_message_size, 10);
    }
}
