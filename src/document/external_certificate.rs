//! External X.509 certificate document (no private key held).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::cert::CertificateValidator;
use super::error::DocumentError;

/// Public body: the certificate PEM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExternalCertificatePublic {
    #[serde(rename = "secw_external_certificate_pem")]
    pub pem: String,
}

impl ExternalCertificatePublic {
    pub fn validate(&self, certs: &dyn CertificateValidator) -> Result<(), DocumentError> {
        if self.pem.is_empty() {
            return Err(DocumentError::InvalidFormat { field: "pem".into() });
        }
        certs
            .validate_certificate_pem(&self.pem)
            .map_err(|_| DocumentError::InvalidFormat { field: "pem".into() })
    }
}
