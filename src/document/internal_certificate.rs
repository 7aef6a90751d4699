//! Internal X.509 certificate document: a certificate paired with the
//! private key that was used to sign its public key.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::cert::CertificateValidator;
use super::error::DocumentError;

/// Public body: the certificate PEM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InternalCertificatePublic {
    #[serde(rename = "secw_internal_certificate_pem")]
    pub pem: String,
}

/// Secret body: the private key PEM. Zeroized on drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Zeroize, ZeroizeOnDrop)]
pub struct InternalCertificateSecret {
    #[serde(rename = "secw_internal_certificate_private_key_pem")]
    pub private_key_pem: String,
}

impl InternalCertificatePublic {
    /// Validates both PEM blobs parse, and that the certificate's public
    /// key matches the private key's.
    pub fn validate(
        &self,
        secret: Option<&InternalCertificateSecret>,
        certs: &dyn CertificateValidator,
    ) -> Result<(), DocumentError> {
        if self.pem.is_empty() {
            return Err(DocumentError::InvalidFormat { field: "pem".into() });
        }
        certs
            .validate_certificate_pem(&self.pem)
            .map_err(|_| DocumentError::InvalidFormat { field: "pem".into() })?;

        let secret = secret.ok_or_else(|| DocumentError::InvalidFormat {
            field: "private_key_pem".into(),
        })?;
        if secret.private_key_pem.is_empty() {
            return Err(DocumentError::InvalidFormat {
                field: "private_key_pem".into(),
            });
        }
        certs
            .validate_private_key_pem(&secret.private_key_pem)
            .map_err(|_| DocumentError::InvalidFormat {
                field: "private_key_pem".into(),
            })?;

        let cert_key = certs
            .public_key_fingerprint(&self.pem)
            .map_err(|_| DocumentError::InvalidFormat { field: "pem".into() })?;
        let priv_key = certs
            .public_key_fingerprint(&secret.private_key_pem)
            .map_err(|_| DocumentError::InvalidFormat {
                field: "private_key_pem".into(),
            })?;
        if cert_key != priv_key {
            return Err(DocumentError::InvalidFormat {
                field: "private_key_pem".into(),
            });
        }
        Ok(())
    }
}
