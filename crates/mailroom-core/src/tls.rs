//! TLS acceptor loading.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::ServerConfig;
use rustls_pemfile::{certs, private_key};
use tokio_rustls::TlsAcceptor;
use tracing::info;

use crate::{Error, Result};

/// Builds a server acceptor from a PEM certificate chain and private key.
///
/// # Errors
///
/// Returns an error if either file cannot be read, holds no usable PEM
/// item, or the key does not match the certificate.
pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor> {
    let chain = certs(&mut BufReader::new(File::open(cert_path)?))
        .collect::<std::io::Result<Vec<_>>>()?;
    if chain.is_empty() {
        return Err(Error::Config(format!("no certificate in {}", cert_path.display())));
    }
    let key = private_key(&mut BufReader::new(File::open(key_path)?))?
        .ok_or_else(|| Error::Config(format!("no private key in {}", key_path.display())))?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(chain, key)?;
    info!(cert = %cert_path.display(), "TLS certificate loaded");
    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Loads an acceptor when both paths are configured.
///
/// Returns `Ok(None)` when either path is missing; the TLS-only listeners
/// are then skipped.
///
/// # Errors
///
/// Returns an error if both paths are set but loading fails.
pub fn optional_acceptor(
    cert_path: Option<&Path>,
    key_path: Option<&Path>,
) -> Result<Option<TlsAcceptor>> {
    match (cert_path, key_path) {
        (Some(cert), Some(key)) => load_acceptor(cert, key).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_pair_disables_tls() {
        assert!(optional_acceptor(None, None).unwrap_or_default().is_none());
        let only_cert = optional_acceptor(Some(Path::new("/nonexistent/cert.pem")), None);
        assert!(matches!(only_cert, Ok(None)));
    }

    #[test]
    fn test_unreadable_files_are_errors() {
        let result = load_acceptor(
            Path::new("/nonexistent/cert.pem"),
            Path::new("/nonexistent/key.pem"),
        );
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
