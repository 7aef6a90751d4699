//! SNMPv1 credential document.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::DocumentError;

/// Public body of an SNMPv1 document. SNMPv1 carries no secret part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Snmpv1Public {
    /// Community string. Plaintext by protocol design, hence public.
    #[serde(rename = "secw_snmpv1_community_name")]
    pub community_name: String,
}

impl Snmpv1Public {
    /// Validates `community_name` is non-empty.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.community_name.is_empty() {
            return Err(DocumentError::InvalidFormat {
                field: "community_name".into(),
            });
        }
        Ok(())
    }
}
