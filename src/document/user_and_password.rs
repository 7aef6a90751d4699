//! Username/password credential document.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::DocumentError;

/// Public body: the username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UserAndPasswordPublic {
    #[serde(rename = "secw_user_and_password_username")]
    pub username: String,
}

/// Secret body: the password. Zeroized on drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Zeroize, ZeroizeOnDrop)]
pub struct UserAndPasswordSecret {
    #[serde(rename = "secw_user_and_password_password")]
    pub password: String,
}

impl UserAndPasswordPublic {
    pub fn validate(&self, secret: Option<&UserAndPasswordSecret>) -> Result<(), DocumentError> {
        if self.username.is_empty() {
            return Err(DocumentError::InvalidFormat {
                field: "username".into(),
            });
        }
        if let Some(secret) = secret {
            if secret.password.is_empty() {
                return Err(DocumentError::InvalidFormat {
                    field: "password".into(),
                });
            }
        }
        Ok(())
    }
}
