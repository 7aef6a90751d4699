//! Certificate parsing is a named collaborator, not part of this crate's
//! core. [`CertificateValidator`] is the seam
//! a real X.509 library plugs into; [`NullCertificateValidator`] is a
//! stand-in good enough to exercise the document model's validation flow
//! in tests without pulling in a PEM/X.509 parser.

use thiserror::Error;

/// Failure classifications a real certificate parser would surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertError {
    /// The PEM blob could not be parsed as an X.509 certificate or key.
    #[error("could not parse PEM: {0}")]
    Unparseable(String),
}

/// Collaborator seam for X.509 parsing, owned by the SWS server.
pub trait CertificateValidator: Send + Sync {
    /// Returns `Ok(())` iff `pem` parses as a well-formed X.509 certificate.
    fn validate_certificate_pem(&self, pem: &str) -> Result<(), CertError>;

    /// Returns `Ok(())` iff `pem` parses as a well-formed private key.
    fn validate_private_key_pem(&self, pem: &str) -> Result<(), CertError>;

    /// Extracts a comparable public-key fingerprint from either a
    /// certificate PEM or a private-key PEM, so a caller can check that a
    /// certificate and a private key belong together.
    fn public_key_fingerprint(&self, pem: &str) -> Result<Vec<u8>, CertError>;
}

/// A validator with no real parsing: it accepts any blob that looks like
/// armored PEM (`-----BEGIN ... -----END ...-----`) and derives a
/// fingerprint from the bytes between the markers. This is enough to
/// exercise the validation wiring in unit tests; production deployments
/// supply a real X.509-backed implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCertificateValidator;

impl NullCertificateValidator {
    fn inner_bytes<'a>(pem: &'a str) -> Result<&'a str, CertError> {
        let start = pem
            .find("-----BEGIN")
            .ok_or_else(|| CertError::Unparseable("missing PEM header".into()))?;
        let end = pem
            .find("-----END")
            .ok_or_else(|| CertError::Unparseable("missing PEM footer".into()))?;
        if end <= start {
            return Err(CertError::Unparseable("malformed PEM framing".into()));
        }
        Ok(&pem[start..end])
    }
}

impl CertificateValidator for NullCertificateValidator {
    fn validate_certificate_pem(&self, pem: &str) -> Result<(), CertError> {
        Self::inner_bytes(pem).map(|_| ())
    }

    fn validate_private_key_pem(&self, pem: &str) -> Result<(), CertError> {
        Self::inner_bytes(pem).map(|_| ())
    }

    fn public_key_fingerprint(&self, pem: &str) -> Result<Vec<u8>, CertError> {
        let body = Self::inner_bytes(pem)?;
        let mut hash: u64 = 1469598103934665603;
        for byte in body.bytes().filter(|b| !b.is_ascii_whitespace()) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(1099511628211);
        }
        Ok(hash.to_be_bytes().to_vec())
    }
}
