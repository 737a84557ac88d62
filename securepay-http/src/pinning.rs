//! Public key pinning.
//!
//! The pinned value is the base64 SHA-256 digest of a certificate's DER
//! `SubjectPublicKeyInfo`. A chain is accepted when regular WebPKI
//! validation succeeds and at least one certificate in it carries a pinned
//! key.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;
use x509_parser::parse_x509_certificate;

use crate::{GatewayError, Result};

/// DER `SubjectPublicKeyInfo` of an X.509 certificate, header included.
pub fn subject_public_key_info(certificate: &[u8]) -> Option<&[u8]> {
    parse_x509_certificate(certificate)
        .ok()
        .map(|(_, parsed)| parsed.tbs_certificate.subject_pki.raw)
}

/// Pin value for a DER-encoded public key info.
pub fn spki_pin(spki: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(spki))
}

/// Pin value for a certificate, if its key info can be located.
pub fn certificate_pin(certificate: &[u8]) -> Option<String> {
    subject_public_key_info(certificate).map(spki_pin)
}

/// WebPKI verification followed by a public key pin check.
#[derive(Debug)]
pub struct PinnedCertVerifier {
    inner: Arc<WebPkiServerVerifier>,
    pins: Vec<String>,
}

impl PinnedCertVerifier {
    pub fn new<I, S>(pins: I, provider: Arc<CryptoProvider>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
            .build()
            .map_err(|e| GatewayError::Tls(e.to_string()))?;

        Ok(Self {
            inner,
            pins: pins.into_iter().map(Into::into).collect(),
        })
    }

    pub fn pins(&self) -> &[String] {
        &self.pins
    }

    /// Check a single certificate against the pin set.
    pub fn matches_pin(&self, certificate: &CertificateDer<'_>) -> bool {
        certificate_pin(certificate.as_ref())
            .is_some_and(|pin| self.pins.iter().any(|expected| *expected == pin))
    }
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)?;

        let mut chain = std::iter::once(end_entity).chain(intermediates.iter());
        if chain.any(|certificate| self.matches_pin(certificate)) {
            Ok(ServerCertVerified::assertion())
        } else {
            warn!(server = ?server_name, "Certificate chain does not carry a pinned key");
            Err(rustls::Error::InvalidCertificate(
                CertificateError::ApplicationVerificationFailure,
            ))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// TLS client configuration that only trusts the given pins.
pub fn pinned_client_config(pins: &[&str]) -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = PinnedCertVerifier::new(pins.iter().copied(), provider.clone())?;

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| GatewayError::Tls(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    Ok(config)
}
