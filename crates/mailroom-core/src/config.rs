//! Server configuration.
//!
//! Read once at startup and never changed afterwards. The binary fills it
//! from flags and environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use mailroom_imap::Security;
use mailroom_smtp::Mode;

/// Default mail domain.
pub const DEFAULT_DOMAIN: &str = "localhost";

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Local mail domain; addresses in it belong to local users.
    pub domain: String,
    /// Name announced in greetings.
    pub hostname: String,
    /// Address the IMAP listeners bind to.
    pub imap_bind: IpAddr,
    /// Address the SMTP listeners bind to.
    pub smtp_bind: IpAddr,
    /// Port overrides, `None` for the protocol default.
    pub ports: Ports,
    /// PEM certificate chain.
    pub tls_cert: Option<PathBuf>,
    /// PEM private key.
    pub tls_key: Option<PathBuf>,
    /// Password of the `admin` user created at startup.
    pub admin_password: Option<String>,
    /// JSON file with more users to create.
    pub users_file: Option<PathBuf>,
    /// Relay endpoint; outgoing mail is only stored when unset.
    pub relay_url: Option<String>,
    /// Relay bearer token.
    pub relay_api_key: Option<String>,
    /// Largest message accepted over SMTP.
    pub max_message_size: usize,
}

/// Listener port overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ports {
    /// Plain IMAP (143).
    pub imap: Option<u16>,
    /// IMAP over TLS (993).
    pub imaps: Option<u16>,
    /// SMTP relay (25).
    pub smtp: Option<u16>,
    /// SMTP over TLS (465).
    pub smtps: Option<u16>,
    /// Submission (587).
    pub submission: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            hostname: DEFAULT_DOMAIN.to_string(),
            imap_bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            smtp_bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            ports: Ports::default(),
            tls_cert: None,
            tls_key: None,
            admin_password: None,
            users_file: None,
            relay_url: None,
            relay_api_key: None,
            max_message_size: mailroom_smtp::session::DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl Config {
    /// Returns true if both halves of the certificate pair are set.
    #[must_use]
    pub const fn has_certificate(&self) -> bool {
        self.tls_cert.is_some() && self.tls_key.is_some()
    }

    /// IMAP listeners to start: plain always, TLS with a certificate.
    #[must_use]
    pub fn imap_listeners(&self, tls_available: bool) -> Vec<mailroom_imap::Config> {
        let mut listeners = vec![Security::None];
        if tls_available {
            listeners.push(Security::Implicit);
        }
        listeners
            .into_iter()
            .map(|security| {
                let port = match security {
                    Security::None => self.ports.imap,
                    Security::Implicit => self.ports.imaps,
                };
                let addr = SocketAddr::new(self.imap_bind, port.unwrap_or(security.default_port()));
                mailroom_imap::Config::new(addr, security)
            })
            .collect()
    }

    /// SMTP listeners to start: 25 always, 465 and 587 with a certificate.
    #[must_use]
    pub fn smtp_listeners(&self, tls_available: bool) -> Vec<mailroom_smtp::Config> {
        [Mode::Relay, Mode::Implicit, Mode::Submission]
            .into_iter()
            .filter(|mode| tls_available || !mode.requires_tls())
            .map(|mode| {
                let port = match mode {
                    Mode::Relay => self.ports.smtp,
                    Mode::Implicit => self.ports.smtps,
                    Mode::Submission => self.ports.submission,
                };
                let addr = SocketAddr::new(self.smtp_bind, port.unwrap_or(mode.default_port()));
                mailroom_smtp::Config::new(addr, mode, &self.hostname, &self.domain)
                    .with_max_message_size(self.max_message_size)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_certificate_only_plain_listeners() {
        let config = Config::default();
        assert!(!config.has_certificate());

        let smtp = config.smtp_listeners(false);
        assert_eq!(smtp.len(), 1);
        assert_eq!(smtp[0].mode, Mode::Relay);
        assert_eq!(smtp[0].bind_addr.port(), 25);

        let imap = config.imap_listeners(false);
        assert_eq!(imap.len(), 1);
        assert_eq!(imap[0].bind_addr.port(), 143);
    }

    #[test]
    fn test_with_certificate_every_listener() {
        let config = Config {
            tls_cert: Some("cert.pem".into()),
            tls_key: Some("key.pem".into()),
            ..Config::default()
        };
        assert!(config.has_certificate());

        let ports: Vec<u16> = config
            .smtp_listeners(true)
            .iter()
            .map(|l| l.bind_addr.port())
            .collect();
        assert_eq!(ports, vec![25, 465, 587]);
        let ports: Vec<u16> = config
            .imap_listeners(true)
            .iter()
            .map(|l| l.bind_addr.port())
            .collect();
        assert_eq!(ports, vec![143, 993]);
    }

    #[test]
    fn test_port_overrides_and_domain() {
        let config = Config {
            domain: "example.com".into(),
            hostname: "mx.example.com".into(),
            ports: Ports {
                smtp: Some(2525),
                imap: Some(1143),
                ..Ports::default()
            },
            ..Config::default()
        };
        let smtp = &config.smtp_listeners(false)[0];
        assert_eq!(smtp.bind_addr.port(), 2525);
        assert_eq!(smtp.domain, "example.com");
        assert_eq!(smtp.hostname, "mx.example.com");
        assert_eq!(config.imap_listeners(false)[0].bind_addr.port(), 1143);
    }
}
