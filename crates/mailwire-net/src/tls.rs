//! TLS configuration and connector construction.

use std::sync::Arc;

use rustls::SignatureScheme;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::TlsConnector;

use crate::Result;

/// TLS settings applied when connecting or upgrading a stream.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Whether the server certificate chain is validated.
    ///
    /// Disabling validation is intended for test servers with self-signed
    /// certificates. The channel-binding digest is still available.
    pub validate_server: bool,
    /// Hostname used for SNI and certificate matching instead of the
    /// connection host.
    pub hostname_override: Option<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            validate_server: true,
            hostname_override: None,
        }
    }
}

impl TlsConfig {
    /// Creates a configuration that validates the server certificate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            validate_server: true,
            hostname_override: None,
        }
    }

    /// Disables server certificate validation.
    #[must_use]
    pub const fn danger_skip_validation(mut self) -> Self {
        self.validate_server = false;
        self
    }

    /// Overrides the hostname used for SNI and certificate matching.
    #[must_use]
    pub fn hostname_override(mut self, hostname: impl Into<String>) -> Self {
        self.hostname_override = Some(hostname.into());
        self
    }

    /// Resolves the effective TLS server name for `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid DNS name.
    pub fn server_name(&self, host: &str) -> Result<ServerName<'static>> {
        let name = self.hostname_override.as_deref().unwrap_or(host);
        Ok(ServerName::try_from(name.to_string())?)
    }

    /// Builds a TLS connector for this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client configuration cannot be built.
    pub fn connector(&self) -> Result<TlsConnector> {
        let config = if self.validate_server {
            let root_store = rustls::RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
            };
            rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth()
        } else {
            rustls::ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerification))
                .with_no_client_auth()
        };

        Ok(TlsConnector::from(Arc::new(config)))
    }
}

/// Certificate verifier that accepts any server certificate.
///
/// Installed only when `validate_server` is false.
#[derive(Debug)]
struct NoVerification;

impl ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_validates() {
        let config = TlsConfig::default();
        assert!(config.validate_server);
        assert!(config.hostname_override.is_none());
    }

    #[test]
    fn skip_validation() {
        let config = TlsConfig::new().danger_skip_validation();
        assert!(!config.validate_server);
    }

    #[test]
    fn server_name_uses_override() {
        let config = TlsConfig::new().hostname_override("mail.example.com");
        let name = config.server_name("10.0.0.1").unwrap();
        assert!(matches!(name, ServerName::DnsName(_)));
    }

    #[test]
    fn connector_builds_in_both_modes() {
        assert!(TlsConfig::new().connector().is_ok());
        assert!(
            TlsConfig::new()
                .danger_skip_validation()
                .connector()
                .is_ok()
        );
    }
}
