//! SNMPv3 credential document.

use std::borrow::Cow;

use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::DocumentError;

/// SNMPv3 security level, wire-encoded `NoAuthNoPriv=0, AuthNoPriv=1,
/// AuthPriv=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    NoAuthNoPriv,
    AuthNoPriv,
    AuthPriv,
}

/// SNMPv3 authentication protocol, wire-encoded `MD5=0, SHA=1, SHA256=2,
/// SHA384=3, SHA512=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProtocol {
    Md5,
    Sha,
    Sha256,
    Sha384,
    Sha512,
}

/// SNMPv3 privacy protocol, wire-encoded `DES=0, AES=1, AES192=2, AES256=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivProtocol {
    Des,
    Aes,
    Aes192,
    Aes256,
}

macro_rules! u8_enum_codec {
    ($ty:ty, $err_field:expr, [$($variant:ident = $code:expr),+ $(,)?]) => {
        impl $ty {
            fn to_code(self) -> u8 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            fn from_code(code: u8) -> Result<Self, DocumentError> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(DocumentError::InvalidFormat { field: $err_field.into() }),
                }
            }
        }

        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_u8(self.to_code())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let code = u8::deserialize(deserializer)?;
                Self::from_code(code).map_err(serde::de::Error::custom)
            }
        }

        impl JsonSchema for $ty {
            fn schema_name() -> Cow<'static, str> {
                Cow::Borrowed(stringify!($ty))
            }

            fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
                let schema_value = serde_json::json!({
                    "type": "integer",
                    "enum": [$($code),+],
                });
                Schema::try_from(schema_value).expect("valid schema")
            }
        }
    };
}

u8_enum_codec!(SecurityLevel, "security_level", [NoAuthNoPriv = 0, AuthNoPriv = 1, AuthPriv = 2]);
u8_enum_codec!(AuthProtocol, "auth_protocol", [Md5 = 0, Sha = 1, Sha256 = 2, Sha384 = 3, Sha512 = 4]);
u8_enum_codec!(PrivProtocol, "priv_protocol", [Des = 0, Aes = 1, Aes192 = 2, Aes256 = 3]);

/// Public body of an SNMPv3 document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Snmpv3Public {
    #[serde(rename = "secw_snmpv3_security_level")]
    pub security_level: SecurityLevel,
    #[serde(rename = "secw_snmpv3_security_name")]
    pub security_name: String,
    #[serde(rename = "secw_snmpv3_auth_protocol")]
    pub auth_protocol: AuthProtocol,
    #[serde(rename = "secw_snmpv3_priv_protocol")]
    pub priv_protocol: PrivProtocol,
}

/// Secret body of an SNMPv3 document. Zeroized on drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Zeroize, ZeroizeOnDrop)]
pub struct Snmpv3Secret {
    #[serde(rename = "secw_snmpv3_auth_password")]
    pub auth_password: String,
    #[serde(rename = "secw_snmpv3_priv_password")]
    pub priv_password: String,
}

impl Snmpv3Public {
    /// Validates `security_name` is set and that, per `security_level`,
    /// the required passwords in `secret` are present and non-empty.
    pub fn validate(&self, secret: Option<&Snmpv3Secret>) -> Result<(), DocumentError> {
        if self.security_name.is_empty() {
            return Err(DocumentError::InvalidFormat {
                field: "security_name".into(),
            });
        }

        match self.security_level {
            SecurityLevel::NoAuthNoPriv => Ok(()),
            SecurityLevel::AuthNoPriv => {
                let secret = secret.ok_or_else(|| DocumentError::InvalidFormat {
                    field: "auth_password".into(),
                })?;
                if secret.auth_password.is_empty() {
                    return Err(DocumentError::InvalidFormat {
                        field: "auth_password".into(),
                    });
                }
                Ok(())
            }
            SecurityLevel::AuthPriv => {
                let secret = secret.ok_or_else(|| DocumentError::InvalidFormat {
                    field: "auth_password".into(),
                })?;
                if secret.auth_password.is_empty() {
                    return Err(DocumentError::InvalidFormat {
                        field: "auth_password".into(),
                    });
                }
                if secret.priv_password.is_empty() {
                    return Err(DocumentError::InvalidFormat {
                        field: "priv_password".into(),
                    });
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_auth_no_priv_accepts_empty_passwords() {
        let pub_body = Snmpv3Public {
            security_level: SecurityLevel::NoAuthNoPriv,
            security_name: "n".into(),
            auth_protocol: AuthProtocol::Md5,
            priv_protocol: PrivProtocol::Des,
        };
        assert!(pub_body.validate(None).is_ok());
    }

    #[test]
    fn auth_no_priv_requires_auth_password() {
        let pub_body = Snmpv3Public {
            security_level: SecurityLevel::AuthNoPriv,
            security_name: "n".into(),
            auth_protocol: AuthProtocol::Sha,
            priv_protocol: PrivProtocol::Des,
        };
        assert!(pub_body.validate(None).is_err());
        let secret = Snmpv3Secret {
            auth_password: "a".into(),
            priv_password: "".into(),
        };
        assert!(pub_body.validate(Some(&secret)).is_ok());
    }

    #[test]
    fn auth_priv_requires_both_passwords() {
        let pub_body = Snmpv3Public {
            security_level: SecurityLevel::AuthPriv,
            security_name: "n".into(),
            auth_protocol: AuthProtocol::Sha256,
            priv_protocol: PrivProtocol::Aes,
        };
        let partial = Snmpv3Secret {
            auth_password: "a".into(),
            priv_password: "".into(),
        };
        assert!(pub_body.validate(Some(&partial)).is_err());
        let full = Snmpv3Secret {
            auth_password: "a".into(),
            priv_password: "p".into(),
        };
        assert!(pub_body.validate(Some(&full)).is_ok());
    }

    #[test]
    fn security_name_required_regardless_of_level() {
        let pub_body = Snmpv3Public {
            security_level: SecurityLevel::NoAuthNoPriv,
            security_name: "".into(),
            auth_protocol: AuthProtocol::Md5,
            priv_protocol: PrivProtocol::Des,
        };
        assert!(pub_body.validate(None).is_err());
    }

    #[test]
    fn wire_codes_roundtrip() {
        let json = serde_json::to_value(SecurityLevel::AuthPriv).unwrap();
        assert_eq!(json, serde_json::json!(2));
        let back: SecurityLevel = serde_json::from_value(json).unwrap();
        assert_eq!(back, SecurityLevel::AuthPriv);
    }
}
