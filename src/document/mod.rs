//! The document model: a closed set of typed credential documents with a
//! public/secret split, strict validation, and a normal JSON codec. SRR's
//! variant of the codec (secret sub-object replaced by ciphertext) lives
//! in [`crate::srr`], which reuses [`Document::public_json`] and layers
//! encryption on top of [`Document::secret_json`].

pub mod cert;
pub mod error;
pub mod external_certificate;
pub mod internal_certificate;
pub mod snmpv1;
pub mod snmpv3;
pub mod user_and_password;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub use cert::{CertError, CertificateValidator, NullCertificateValidator};
pub use error::DocumentError;
pub use external_certificate::ExternalCertificatePublic;
pub use internal_certificate::{InternalCertificatePublic, InternalCertificateSecret};
pub use snmpv1::Snmpv1Public;
pub use snmpv3::{AuthProtocol, PrivProtocol, SecurityLevel, Snmpv3Public, Snmpv3Secret};
pub use user_and_password::{UserAndPasswordPublic, UserAndPasswordSecret};

/// Server-assigned opaque identifier, unique within a portfolio.
pub type DocumentId = String;
/// Usage label gating access to a document, e.g. `discovery_monitoring`.
pub type UsageId = String;
/// Free-form classification string attached to a document.
pub type Tag = String;

const ID_ENTRY: &str = "secw_doc_id";
const NAME_ENTRY: &str = "secw_doc_name";
const TYPE_ENTRY: &str = "secw_doc_type";
const TAGS_ENTRY: &str = "secw_doc_tags";
const USAGES_ENTRY: &str = "secw_doc_usages";
const PUBLIC_ENTRY: &str = "secw_doc_public";
const PRIVATE_ENTRY: &str = "secw_doc_private";

/// The closed set of supported credential document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentType {
    Snmpv1,
    Snmpv3,
    UserAndPassword,
    ExternalCertificate,
    InternalCertificate,
}

impl DocumentType {
    /// The exact wire string used in `secw_doc_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Snmpv1 => "Snmpv1",
            Self::Snmpv3 => "Snmpv3",
            Self::UserAndPassword => "UserAndPassword",
            Self::ExternalCertificate => "ExternalCertificate",
            Self::InternalCertificate => "InternalCertificate",
        }
    }

    /// Parses a wire string into a [`DocumentType`].
    pub fn parse(raw: &str) -> Result<Self, DocumentError> {
        match raw {
            "Snmpv1" => Ok(Self::Snmpv1),
            "Snmpv3" => Ok(Self::Snmpv3),
            "UserAndPassword" => Ok(Self::UserAndPassword),
            "ExternalCertificate" => Ok(Self::ExternalCertificate),
            "InternalCertificate" => Ok(Self::InternalCertificate),
            other => Err(DocumentError::UnknownType(other.to_string())),
        }
    }

    /// All supported types, in the order documents are commonly listed.
    pub fn all() -> [Self; 5] {
        [
            Self::Snmpv1,
            Self::Snmpv3,
            Self::UserAndPassword,
            Self::ExternalCertificate,
            Self::InternalCertificate,
        ]
    }
}

impl Serialize for DocumentType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DocumentType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Header fields shared by every document variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeader {
    pub id: DocumentId,
    pub name: String,
    pub doc_type: DocumentType,
    pub tags: BTreeSet<Tag>,
    pub usages: BTreeSet<UsageId>,
}

/// The type-tagged body of a document: a public part always present, and
/// a secret part present only when the holder knows secrets.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentBody {
    Snmpv1 {
        public: Snmpv1Public,
    },
    Snmpv3 {
        public: Snmpv3Public,
        secret: Option<Snmpv3Secret>,
    },
    UserAndPassword {
        public: UserAndPasswordPublic,
        secret: Option<UserAndPasswordSecret>,
    },
    ExternalCertificate {
        public: ExternalCertificatePublic,
    },
    InternalCertificate {
        public: InternalCertificatePublic,
        secret: Option<InternalCertificateSecret>,
    },
}

impl DocumentBody {
    pub fn doc_type(&self) -> DocumentType {
        match self {
            Self::Snmpv1 { .. } => DocumentType::Snmpv1,
            Self::Snmpv3 { .. } => DocumentType::Snmpv3,
            Self::UserAndPassword { .. } => DocumentType::UserAndPassword,
            Self::ExternalCertificate { .. } => DocumentType::ExternalCertificate,
            Self::InternalCertificate { .. } => DocumentType::InternalCertificate,
        }
    }

    /// Whether this body instance carries its secret part.
    pub fn contains_secret(&self) -> bool {
        match self {
            Self::Snmpv1 { .. } | Self::ExternalCertificate { .. } => true,
            Self::Snmpv3 { secret, .. } => secret.is_some(),
            Self::UserAndPassword { secret, .. } => secret.is_some(),
            Self::InternalCertificate { secret, .. } => secret.is_some(),
        }
    }

    fn public_json(&self) -> Value {
        match self {
            Self::Snmpv1 { public } => serde_json::to_value(public).expect("serializable"),
            Self::Snmpv3 { public, .. } => serde_json::to_value(public).expect("serializable"),
            Self::UserAndPassword { public, .. } => {
                serde_json::to_value(public).expect("serializable")
            }
            Self::ExternalCertificate { public } => {
                serde_json::to_value(public).expect("serializable")
            }
            Self::InternalCertificate { public, .. } => {
                serde_json::to_value(public).expect("serializable")
            }
        }
    }

    fn secret_json(&self) -> Option<Value> {
        match self {
            Self::Snmpv1 { .. } | Self::ExternalCertificate { .. } => None,
            Self::Snmpv3 { secret, .. } => {
                secret.as_ref().map(|s| serde_json::to_value(s).expect("serializable"))
            }
            Self::UserAndPassword { secret, .. } => {
                secret.as_ref().map(|s| serde_json::to_value(s).expect("serializable"))
            }
            Self::InternalCertificate { secret, .. } => {
                secret.as_ref().map(|s| serde_json::to_value(s).expect("serializable"))
            }
        }
    }

    fn from_json(
        doc_type: DocumentType,
        public: &Value,
        secret: Option<&Value>,
    ) -> Result<Self, DocumentError> {
        Ok(match doc_type {
            DocumentType::Snmpv1 => DocumentBody::Snmpv1 {
                public: from_value(public, "community_name")?,
            },
            DocumentType::Snmpv3 => DocumentBody::Snmpv3 {
                public: from_value(public, "security_name")?,
                secret: match secret {
                    Some(v) => Some(from_value(v, "auth_password")?),
                    None => None,
                },
            },
            DocumentType::UserAndPassword => DocumentBody::UserAndPassword {
                public: from_value(public, "username")?,
                secret: match secret {
                    Some(v) => Some(from_value(v, "password")?),
                    None => None,
                },
            },
            DocumentType::ExternalCertificate => DocumentBody::ExternalCertificate {
                public: from_value(public, "pem")?,
            },
            DocumentType::InternalCertificate => DocumentBody::InternalCertificate {
                public: from_value(public, "pem")?,
                secret: match secret {
                    Some(v) => Some(from_value(v, "private_key_pem")?),
                    None => None,
                },
            },
        })
    }

    /// Validates this body; requires a certificate collaborator for the
    /// two certificate variants, since cert parsing is supplied by the
    /// caller rather than implemented in this crate.
    pub fn validate(&self, certs: &dyn CertificateValidator) -> Result<(), DocumentError> {
        match self {
            Self::Snmpv1 { public } => public.validate(),
            Self::Snmpv3 { public, secret } => public.validate(secret.as_ref()),
            Self::UserAndPassword { public, secret } => public.validate(secret.as_ref()),
            Self::ExternalCertificate { public } => public.validate(certs),
            Self::InternalCertificate { public, secret } => {
                public.validate(secret.as_ref(), certs)
            }
        }
    }

    /// Compares only the public fields of two bodies of the same type.
    pub fn non_secret_equals(&self, other: &Self) -> bool {
        self.public_json() == other.public_json()
    }

    /// Compares only the secret fields; two bodies missing their secret
    /// are considered equal.
    pub fn secret_equals(&self, other: &Self) -> bool {
        self.secret_json() == other.secret_json()
    }

    /// Returns a copy of this body with its secret part taken from
    /// `donor` if this body doesn't carry one of its own. Used by the
    /// portfolio store to merge a without-secret update into the
    /// existing stored document, so an update that omits the secret
    /// part never erases it.
    pub fn with_secret_from(self, donor: &Self) -> Self {
        match (self, donor) {
            (Self::Snmpv3 { public, secret: None }, Self::Snmpv3 { secret: donor_secret, .. }) => {
                Self::Snmpv3 {
                    public,
                    secret: donor_secret.clone(),
                }
            }
            (
                Self::UserAndPassword { public, secret: None },
                Self::UserAndPassword { secret: donor_secret, .. },
            ) => Self::UserAndPassword {
                public,
                secret: donor_secret.clone(),
            },
            (
                Self::InternalCertificate { public, secret: None },
                Self::InternalCertificate { secret: donor_secret, .. },
            ) => Self::InternalCertificate {
                public,
                secret: donor_secret.clone(),
            },
            (body, _) => body,
        }
    }
}

fn from_value<T: serde::de::DeserializeOwned>(
    value: &Value,
    field_on_err: &'static str,
) -> Result<T, DocumentError> {
    serde_json::from_value(value.clone()).map_err(|_| DocumentError::InvalidFormat {
        field: field_on_err.into(),
    })
}

/// A full credential document: header plus type-tagged body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub header: DocumentHeader,
    pub body: DocumentBody,
}

impl Document {
    /// Validates header and body. Called before every insert and update.
    pub fn validate(&self, certs: &dyn CertificateValidator) -> Result<(), DocumentError> {
        if self.header.name.is_empty() {
            return Err(DocumentError::InvalidFormat { field: "name".into() });
        }
        self.body.validate(certs)
    }

    /// `true` if this in-memory instance carries its secret part.
    pub fn contains_secret(&self) -> bool {
        self.body.contains_secret()
    }

    /// Serializes header + public body only.
    pub fn to_public_json(&self) -> Value {
        json!({
            ID_ENTRY: self.header.id,
            NAME_ENTRY: self.header.name,
            TYPE_ENTRY: self.header.doc_type.as_str(),
            TAGS_ENTRY: self.header.tags,
            USAGES_ENTRY: self.header.usages,
            PUBLIC_ENTRY: self.body.public_json(),
        })
    }

    /// Serializes header + public + secret body, iff the secret is held.
    pub fn to_full_json(&self) -> Value {
        let mut value = self.to_public_json();
        if let Some(secret) = self.body.secret_json() {
            value
                .as_object_mut()
                .expect("object")
                .insert(PRIVATE_ENTRY.to_string(), secret);
        }
        value
    }

    /// Decodes a normal-form JSON document. `secw_doc_id` is optional
    /// (absent on CREATE payloads, where the server assigns it).
    pub fn from_json(value: &Value) -> Result<Self, DocumentError> {
        let obj = value
            .as_object()
            .ok_or(DocumentError::InvalidFormat { field: "document".into() })?;

        let name = obj
            .get(NAME_ENTRY)
            .and_then(Value::as_str)
            .ok_or(DocumentError::InvalidFormat { field: "name".into() })?
            .to_string();

        let type_str = obj
            .get(TYPE_ENTRY)
            .and_then(Value::as_str)
            .ok_or(DocumentError::InvalidFormat { field: "type".into() })?;
        let doc_type = DocumentType::parse(type_str)?;

        let id = obj
            .get(ID_ENTRY)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let tags: BTreeSet<Tag> = obj
            .get(TAGS_ENTRY)
            .map(|v| from_value(v, "tags"))
            .transpose()?
            .unwrap_or_default();
        let usages: BTreeSet<UsageId> = obj
            .get(USAGES_ENTRY)
            .map(|v| from_value(v, "usages"))
            .transpose()?
            .unwrap_or_default();

        let public = obj
            .get(PUBLIC_ENTRY)
            .ok_or(DocumentError::InvalidFormat { field: "public".into() })?;
        let secret = obj.get(PRIVATE_ENTRY);

        let body = DocumentBody::from_json(doc_type, public, secret)?;

        Ok(Document {
            header: DocumentHeader {
                id,
                name,
                doc_type,
                tags,
                usages,
            },
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user_and_password() -> Document {
        Document {
            header: DocumentHeader {
                id: "id-1".into(),
                name: "my-doc".into(),
                doc_type: DocumentType::UserAndPassword,
                tags: BTreeSet::new(),
                usages: BTreeSet::from(["discovery_monitoring".to_string()]),
            },
            body: DocumentBody::UserAndPassword {
                public: UserAndPasswordPublic {
                    username: "admin".into(),
                },
                secret: Some(UserAndPasswordSecret {
                    password: "hunter2".into(),
                }),
            },
        }
    }

    #[test]
    fn full_json_roundtrip_preserves_secret() {
        let doc = sample_user_and_password();
        let json = doc.to_full_json();
        let decoded = Document::from_json(&json).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn public_json_omits_private_entry() {
        let doc = sample_user_and_password();
        let json = doc.to_public_json();
        assert!(json.get(PRIVATE_ENTRY).is_none());
    }

    #[test]
    fn empty_username_fails_validation() {
        let mut doc = sample_user_and_password();
        doc.body = DocumentBody::UserAndPassword {
            public: UserAndPasswordPublic { username: "".into() },
            secret: Some(UserAndPasswordSecret {
                password: "x".into(),
            }),
        };
        let certs = NullCertificateValidator;
        assert!(matches!(
            doc.validate(&certs),
            Err(DocumentError::InvalidFormat { field }) if field == "username"
        ));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let value = json!({
            NAME_ENTRY: "x",
            TYPE_ENTRY: "Bogus",
            PUBLIC_ENTRY: {},
        });
        assert!(matches!(
            Document::from_json(&value),
            Err(DocumentError::UnknownType(t)) if t == "Bogus"
        ));
    }

    #[test]
    fn with_secret_from_merges_missing_secret() {
        let existing = sample_user_and_password();
        let mut incoming = existing.clone();
        incoming.body = DocumentBody::UserAndPassword {
            public: UserAndPasswordPublic {
                username: "new-name".into(),
            },
            secret: None,
        };
        let merged_body = incoming.body.with_secret_from(&existing.body);
        assert!(merged_body.contains_secret());
        assert_eq!(
            merged_body.secret_json(),
            existing.body.secret_json()
        );
    }

    #[test]
    fn non_secret_and_secret_equals_are_independent() {
        let a = sample_user_and_password();
        let mut b = a.clone();
        b.body = DocumentBody::UserAndPassword {
            public: UserAndPasswordPublic {
                username: "admin".into(),
            },
            secret: Some(UserAndPasswordSecret {
                password: "different".into(),
            }),
        };
        assert!(a.body.non_secret_equals(&b.body));
        assert!(!a.body.secret_equals(&b.body));
    }
}
