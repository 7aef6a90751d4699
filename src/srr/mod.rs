//! Save/restore (SRR) processor: versioned, passphrase-wrapped export and
//! import for both servers.

pub mod wrap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::mapping::store::{Mapping, MappingStore};
use crate::wallet::portfolio::{Portfolio, WalletDatabase};

/// Collaborator seam for the host-UUID concept behind `check_platform`,
/// stood in for by a stub in tests.
pub trait HostIdentity: Send + Sync {
    fn host_uuid(&self) -> String;
}

/// A fixed UUID, useful for tests and single-host deployments that don't
/// wire a real platform-identity source.
#[derive(Debug, Clone)]
pub struct StaticHostIdentity(pub String);

impl HostIdentity for StaticHostIdentity {
    fn host_uuid(&self) -> String {
        self.0.clone()
    }
}

/// `{version, data}` — one feature's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureData {
    pub version: String,
    pub data: Value,
}

/// `{status: SUCCESS|FAILED, error?}` — one feature's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStatus {
    pub status: FeatureOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeatureOutcome {
    Success,
    Failed,
}

/// `{feature, status}` — the response to one requested feature name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureAndStatus {
    pub feature: FeatureData,
    pub status: FeatureStatus,
}

impl FeatureAndStatus {
    fn success(version: &str, data: Value) -> Self {
        Self {
            feature: FeatureData {
                version: version.to_string(),
                data,
            },
            status: FeatureStatus {
                status: FeatureOutcome::Success,
                error: None,
            },
        }
    }

    fn failed(version: &str, error: impl Into<String>) -> Self {
        Self {
            feature: FeatureData {
                version: version.to_string(),
                data: Value::Null,
            },
            status: FeatureStatus {
                status: FeatureOutcome::Failed,
                error: Some(error.into()),
            },
        }
    }
}

const SECURITY_WALLET_FEATURE_VERSION: &str = "1.0";
const MAPPING_FEATURE_VERSION: &str = "1.0";

/// Builds the `security-wallet` feature response: data is
/// `{check_passphrase, check_platform, portfolios}`.
pub fn save_security_wallet(
    db: &WalletDatabase,
    passphrase: &str,
    host: &dyn HostIdentity,
) -> FeatureAndStatus {
    let check_passphrase = match wrap::wrap(passphrase.as_bytes(), passphrase) {
        Ok(w) => w,
        Err(e) => return FeatureAndStatus::failed(SECURITY_WALLET_FEATURE_VERSION, e.to_string()),
    };
    let check_platform = match wrap::wrap(host.host_uuid().as_bytes(), passphrase) {
        Ok(w) => w,
        Err(e) => return FeatureAndStatus::failed(SECURITY_WALLET_FEATURE_VERSION, e.to_string()),
    };

    let portfolios: Vec<Value> = db
        .portfolios
        .iter()
        .map(|p| {
            json!({
                "version": 1,
                "name": p.name,
                "documents": p.iter().map(crate::document::Document::to_full_json).collect::<Vec<_>>(),
            })
        })
        .collect();

    FeatureAndStatus::success(
        SECURITY_WALLET_FEATURE_VERSION,
        json!({
            "check_passphrase": check_passphrase,
            "check_platform": check_platform,
            "portfolios": portfolios,
        }),
    )
}

/// Restores a wallet from a previously saved `security-wallet` feature
/// payload. On any parse or verification failure, returns `Err` and the
/// caller must keep its previous in-memory state.
pub fn restore_security_wallet(
    data: &Value,
    passphrase: &str,
    host: &dyn HostIdentity,
) -> Result<WalletDatabase, FeatureAndStatus> {
    let fail = |msg: &str| Err(FeatureAndStatus::failed(SECURITY_WALLET_FEATURE_VERSION, msg));

    let check_passphrase = match data.get("check_passphrase").and_then(Value::as_str) {
        Some(v) => v,
        None => return fail("malformed save data: missing check_passphrase"),
    };
    if !wrap::check_passphrase_matches(check_passphrase, passphrase) {
        return fail("Bad passphrase");
    }

    if let Some(check_platform) = data.get("check_platform").and_then(Value::as_str) {
        match wrap::unwrap(check_platform, passphrase) {
            Ok(plain) if plain == host.host_uuid().as_bytes() => {}
            _ => warn!("SRR restore: platform mismatch, restoring with platform-bound fields treated as opaque"),
        }
    }

    let portfolios_json = match data.get("portfolios").and_then(Value::as_array) {
        Some(v) => v.clone(),
        None => return fail("malformed save data: missing portfolios"),
    };

    let mut portfolios = Vec::with_capacity(portfolios_json.len());
    for portfolio_value in portfolios_json {
        let name = portfolio_value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let mut portfolio = Portfolio::new(name.clone());
        let documents = portfolio_value
            .get("documents")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for doc_value in documents {
            let doc = crate::document::Document::from_json(&doc_value)
                .map_err(|e| FeatureAndStatus::failed(SECURITY_WALLET_FEATURE_VERSION, e.to_string()))?;
            let id = doc.header.id.clone();
            portfolio
                .insert(doc, id)
                .map_err(|_| FeatureAndStatus::failed(SECURITY_WALLET_FEATURE_VERSION, "duplicate document on restore"))?;
        }
        portfolios.push(portfolio);
    }

    Ok(WalletDatabase { portfolios })
}

/// Builds the `credential-asset-mapping` feature response: unencrypted
/// `{version: 1, mappings: [...]}`. Mappings never carry secrets, so
/// unlike the wallet feature this one needs no passphrase.
pub fn save_mapping(store: &MappingStore) -> FeatureAndStatus {
    FeatureAndStatus::success(
        MAPPING_FEATURE_VERSION,
        json!({
            "version": 1,
            "mappings": store.all(),
        }),
    )
}

pub fn restore_mapping(data: &Value) -> Result<MappingStore, FeatureAndStatus> {
    let mappings_json = data
        .get("mappings")
        .cloned()
        .ok_or_else(|| FeatureAndStatus::failed(MAPPING_FEATURE_VERSION, "malformed save data: missing mappings"))?;
    let mappings: Vec<Mapping> = serde_json::from_value(mappings_json)
        .map_err(|e| FeatureAndStatus::failed(MAPPING_FEATURE_VERSION, e.to_string()))?;

    let mut store = MappingStore::default();
    for mapping in mappings {
        store
            .insert(mapping)
            .map_err(|_| FeatureAndStatus::failed(MAPPING_FEATURE_VERSION, "duplicate mapping on restore"))?;
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentBody, DocumentHeader, DocumentType, Snmpv3Public, Snmpv3Secret};
    use crate::document::{AuthProtocol, PrivProtocol, SecurityLevel};
    use std::collections::BTreeSet;

    fn wallet_with_one_snmpv3_doc() -> WalletDatabase {
        let mut portfolio = Portfolio::new("default");
        let doc = crate::document::Document {
            header: DocumentHeader {
                id: String::new(),
                name: "Test insert snmpv3".into(),
                doc_type: DocumentType::Snmpv3,
                tags: BTreeSet::new(),
                usages: BTreeSet::from(["discovery_monitoring".to_string()]),
            },
            body: DocumentBody::Snmpv3 {
                public: Snmpv3Public {
                    security_level: SecurityLevel::AuthPriv,
                    security_name: "n".into(),
                    auth_protocol: AuthProtocol::Md5,
                    priv_protocol: PrivProtocol::Aes,
                },
                secret: Some(Snmpv3Secret {
                    auth_password: "a".into(),
                    priv_password: "p".into(),
                }),
            },
        };
        portfolio.insert(doc, "id-1".into()).unwrap();
        WalletDatabase {
            portfolios: vec![portfolio],
        }
    }

    #[test]
    fn s5_save_then_restore_recovers_wallet() {
        let host = StaticHostIdentity("host-uuid-1".into());
        let db = wallet_with_one_snmpv3_doc();
        let saved = save_security_wallet(&db, "12345678", &host);
        assert_eq!(saved.status.status, FeatureOutcome::Success);

        let restored = restore_security_wallet(&saved.feature.data, "12345678", &host).unwrap();
        assert_eq!(restored.portfolios.len(), 1);
        assert_eq!(restored.portfolios[0].len(), 1);
        assert_eq!(
            restored.portfolios[0].get_by_name("Test insert snmpv3").unwrap().header.name,
            "Test insert snmpv3"
        );
    }

    #[test]
    fn s5_wrong_passphrase_fails_with_bad_passphrase() {
        let host = StaticHostIdentity("host-uuid-1".into());
        let db = wallet_with_one_snmpv3_doc();
        let saved = save_security_wallet(&db, "12345678", &host);

        let err = restore_security_wallet(&saved.feature.data, "wrongpass1", &host).unwrap_err();
        assert_eq!(err.status.status, FeatureOutcome::Failed);
        assert_eq!(err.status.error.as_deref(), Some("Bad passphrase"));
    }

    #[test]
    fn restore_with_mismatched_platform_still_succeeds() {
        let host_a = StaticHostIdentity("host-a".into());
        let host_b = StaticHostIdentity("host-b".into());
        let db = wallet_with_one_snmpv3_doc();
        let saved = save_security_wallet(&db, "12345678", &host_a);

        let restored = restore_security_wallet(&saved.feature.data, "12345678", &host_b).unwrap();
        assert_eq!(restored.portfolios.len(), 1);
    }

    #[test]
    fn mapping_save_restore_round_trip() {
        use crate::mapping::store::MappingStatus;
        let mut store = MappingStore::default();
        store
            .insert(Mapping {
                asset_id: "a".into(),
                service_id: "s".into(),
                protocol: "p".into(),
                port: "80".into(),
                credential_id: String::new(),
                status: MappingStatus::Unknown,
                extended_info: Default::default(),
            })
            .unwrap();

        let saved = save_mapping(&store);
        let restored = restore_mapping(&saved.feature.data).unwrap();
        assert_eq!(restored.len(), 1);
    }
}
