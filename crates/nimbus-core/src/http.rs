//! Shared HTTP client construction for provider backends.

use std::path::Path;
use std::time::Duration;

use reqwest::{Certificate, Client};
use tracing::debug;

use crate::error::{Error, Result};

/// Load an additional trusted CA from a PEM file.
pub fn load_ca_certificate(path: &Path) -> Result<Certificate> {
    let pem = std::fs::read(path).map_err(|e| {
        Error::Config(format!("Failed to read CA certificate {}: {}", path.display(), e))
    })?;
    Certificate::from_pem(&pem).map_err(|e| {
        Error::Config(format!("Invalid CA certificate {}: {}", path.display(), e))
    })
}

/// Build a client with request and connect timeouts.
///
/// Certificate validation always stays on; `ca_cert` only adds a root.
pub fn build_client(
    timeout: Duration,
    connect_timeout: Duration,
    ca_cert: Option<&Path>,
) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(connect_timeout);

    if let Some(path) = ca_cert {
        debug!(ca_cert = %path.display(), "Trusting additional CA");
        builder = builder.add_root_certificate(load_ca_certificate(path)?);
    }

    builder
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_without_ca() {
        let client = build_client(Duration::from_secs(8), Duration::from_secs(3), None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_missing_ca_file_is_config_error() {
        let err = load_ca_certificate(Path::new("/nonexistent/ca.pem")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("/nonexistent/ca.pem"));
    }
}
