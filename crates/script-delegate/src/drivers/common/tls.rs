//! TLS settings for delegate connections.
//!
//! `ssl_mode` follows PostgreSQL's `sslmode` vocabulary. PostgreSQL
//! connections get a rustls connector from [`SslMode::postgres_connector`];
//! SQL Server and MySQL translate the mode into their own client options.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::warn;

use crate::error::{DelegateError, Result};

/// Transport security of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// Plain TCP.
    #[default]
    Disable,
    /// Encrypted, server certificate not checked.
    Require,
    /// Encrypted, certificate checked against the web PKI roots.
    VerifyCa,
    /// Encrypted, certificate and hostname checked.
    VerifyFull,
}

impl SslMode {
    /// Parse an `ssl_mode` value. Empty means `disable`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "disable" | "" => Ok(SslMode::Disable),
            "require" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            other => Err(DelegateError::Config(format!(
                "Invalid ssl_mode '{}'. Valid values: disable, require, verify-ca, verify-full",
                other
            ))),
        }
    }

    pub fn requires_tls(&self) -> bool {
        !matches!(self, SslMode::Disable)
    }

    /// Whether the server certificate is accepted without verification.
    pub fn trusts_any_cert(&self) -> bool {
        matches!(self, SslMode::Require)
    }

    /// rustls client settings for this mode, `None` when TLS is off.
    pub fn client_config(&self) -> Option<ClientConfig> {
        match self {
            SslMode::Disable => None,
            SslMode::Require => {
                warn!("ssl_mode=require encrypts traffic without verifying the server certificate");
                Some(
                    ClientConfig::builder()
                        .dangerous()
                        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
                        .with_no_client_auth(),
                )
            }
            SslMode::VerifyCa | SslMode::VerifyFull => {
                let mut roots = rustls::RootCertStore::empty();
                roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
                Some(
                    ClientConfig::builder()
                        .with_root_certificates(roots)
                        .with_no_client_auth(),
                )
            }
        }
    }

    /// TLS connector for `tokio-postgres`, `None` when TLS is off.
    pub fn postgres_connector(&self) -> Option<MakeRustlsConnect> {
        self.client_config().map(MakeRustlsConnect::new)
    }
}

/// Verifier used by `ssl_mode=require`.
#[derive(Debug)]
struct AcceptAnyCert;

impl ServerCertVerifier for AcceptAnyCert {
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
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
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
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_known_modes() {
        assert_eq!(SslMode::parse("").unwrap(), SslMode::Disable);
        assert_eq!(SslMode::parse("Require").unwrap(), SslMode::Require);
        assert_eq!(SslMode::parse("verify-ca").unwrap(), SslMode::VerifyCa);
        assert_eq!(SslMode::parse("VERIFY-FULL").unwrap(), SslMode::VerifyFull);
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        let err = SslMode::parse("prefer").unwrap_err();
        assert!(err.to_string().contains("Invalid ssl_mode 'prefer'"));
    }

    #[test]
    fn test_disable_has_no_connector() {
        assert!(!SslMode::Disable.requires_tls());
        assert!(SslMode::Disable.postgres_connector().is_none());
    }

    #[test]
    fn test_tls_modes_build_connectors() {
        for mode in [SslMode::Require, SslMode::VerifyCa, SslMode::VerifyFull] {
            assert!(mode.requires_tls());
            assert!(mode.postgres_connector().is_some());
        }
        assert!(SslMode::Require.trusts_any_cert());
        assert!(!SslMode::VerifyFull.trusts_any_cert());
    }
}
