//! Credential-asset mapping store: a hash-keyed collection keyed by the
//! `(asset_id, service_id, protocol)` triple.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Status of a credential-asset mapping; a pure datum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum MappingStatus {
    Unknown,
    Valid,
    Error,
}

/// One `(asset_id, service_id, protocol)` → credential/port/status record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Mapping {
    #[serde(rename = "cam_asset")]
    pub asset_id: String,
    #[serde(rename = "cam_service")]
    pub service_id: String,
    #[serde(rename = "cam_protocol")]
    pub protocol: String,
    #[serde(rename = "cam_port")]
    pub port: String,
    #[serde(rename = "cam_credential", default, skip_serializing_if = "String::is_empty")]
    pub credential_id: String,
    #[serde(rename = "cam_status")]
    pub status: MappingStatus,
    #[serde(rename = "cam_extended_info", default)]
    pub extended_info: HashMap<String, String>,
}

/// Deterministic key `"A"+asset+"|S"+service+"|P:"+protocol`. Never
/// exposed on the wire — an internal index only.
pub fn mapping_key(asset_id: &str, service_id: &str, protocol: &str) -> String {
    format!("A{asset_id}|S{service_id}|P:{protocol}")
}

impl Mapping {
    pub fn key(&self) -> String {
        mapping_key(&self.asset_id, &self.service_id, &self.protocol)
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.asset_id.is_empty() {
            return Err("asset_id");
        }
        if self.service_id.is_empty() {
            return Err("service_id");
        }
        if self.protocol.is_empty() {
            return Err("protocol");
        }
        if self.port.is_empty() {
            return Err("port");
        }
        Ok(())
    }
}

/// The mapping database: O(1) average lookup by triple, linear secondary
/// scans — fine given the small expected cardinality of mappings.
#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    records: HashMap<String, Mapping>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingStoreError {
    AlreadyExists,
    DoesNotExist,
}

impl MappingStore {
    pub fn get(&self, asset_id: &str, service_id: &str, protocol: &str) -> Option<&Mapping> {
        self.records.get(&mapping_key(asset_id, service_id, protocol))
    }

    pub fn insert(&mut self, mapping: Mapping) -> Result<(), MappingStoreError> {
        let key = mapping.key();
        if self.records.contains_key(&key) {
            return Err(MappingStoreError::AlreadyExists);
        }
        self.records.insert(key, mapping);
        Ok(())
    }

    pub fn replace(&mut self, mapping: Mapping) -> Result<Mapping, MappingStoreError> {
        let key = mapping.key();
        self.records
            .insert(key, mapping)
            .ok_or(MappingStoreError::DoesNotExist)
    }

    /// Applies `update` to the existing record and stores the result;
    /// fails if no record exists for the triple.
    pub fn modify(
        &mut self,
        asset_id: &str,
        service_id: &str,
        protocol: &str,
        update: impl FnOnce(&mut Mapping),
    ) -> Result<Mapping, MappingStoreError> {
        let key = mapping_key(asset_id, service_id, protocol);
        let record = self.records.get_mut(&key).ok_or(MappingStoreError::DoesNotExist)?;
        update(record);
        Ok(record.clone())
    }

    pub fn remove(&mut self, asset_id: &str, service_id: &str, protocol: &str) -> Result<Mapping, MappingStoreError> {
        self.records
            .remove(&mapping_key(asset_id, service_id, protocol))
            .ok_or(MappingStoreError::DoesNotExist)
    }

    pub fn by_asset(&self, asset_id: &str) -> Vec<&Mapping> {
        self.records.values().filter(|m| m.asset_id == asset_id).collect()
    }

    pub fn by_asset_and_service(&self, asset_id: &str, service_id: &str) -> Vec<&Mapping> {
        self.records
            .values()
            .filter(|m| m.asset_id == asset_id && m.service_id == service_id)
            .collect()
    }

    pub fn by_credential(&self, credential_id: &str) -> Vec<&Mapping> {
        self.records
            .values()
            .filter(|m| m.credential_id == credential_id)
            .collect()
    }

    pub fn all(&self) -> Vec<&Mapping> {
        self.records.values().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let root: Value = serde_json::from_str(&raw)?;
        let mappings: Vec<Mapping> = serde_json::from_value(
            root.get("mappings").cloned().unwrap_or_else(|| json!([])),
        )?;
        let mut store = Self::default();
        for mapping in mappings {
            store.records.insert(mapping.key(), mapping);
        }
        Ok(store)
    }

    /// Atomic whole-file rewrite, same contract as [`crate::wallet::portfolio::WalletDatabase::save`].
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let tmp_path = path.with_extension("json.tmp");
        let body = json!({
            "version": 1,
            "mappings": self.records.values().collect::<Vec<_>>(),
        });
        let pretty = serde_json::to_string_pretty(&body)?;
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(pretty.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Mapping {
        Mapping {
            asset_id: "asset-2".into(),
            service_id: "test-usage-2".into(),
            protocol: "test-proto".into(),
            port: "80".into(),
            credential_id: "Test-mapping".into(),
            status: MappingStatus::Valid,
            extended_info: HashMap::from([("port".to_string(), "80".to_string())]),
        }
    }

    #[test]
    fn s4_mapping_lifecycle() {
        let mut store = MappingStore::default();
        store.insert(sample()).unwrap();

        let got = store.get("asset-2", "test-usage-2", "test-proto").unwrap();
        assert_eq!(got.credential_id, "Test-mapping");

        store
            .modify("asset-2", "test-usage-2", "test-proto", |m| m.status = MappingStatus::Error)
            .unwrap();
        assert_eq!(
            store.get("asset-2", "test-usage-2", "test-proto").unwrap().status,
            MappingStatus::Error
        );

        store.remove("asset-2", "test-usage-2", "test-proto").unwrap();
        assert!(matches!(
            store.remove("asset-2", "test-usage-2", "test-proto"),
            Err(MappingStoreError::DoesNotExist)
        ));
    }

    #[test]
    fn second_create_on_same_triple_fails_and_store_unchanged() {
        let mut store = MappingStore::default();
        store.insert(sample()).unwrap();
        let err = store.insert(sample()).unwrap_err();
        assert_eq!(err, MappingStoreError::AlreadyExists);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn port_update_resets_status_to_unknown() {
        let mut store = MappingStore::default();
        store.insert(sample()).unwrap();
        store
            .modify("asset-2", "test-usage-2", "test-proto", |m| {
                m.port = "81".into();
                m.status = MappingStatus::Unknown;
            })
            .unwrap();
        let got = store.get("asset-2", "test-usage-2", "test-proto").unwrap();
        assert_eq!(got.port, "81");
        assert_eq!(got.status, MappingStatus::Unknown);
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        let mut store = MappingStore::default();
        store.insert(sample()).unwrap();
        store.save(&path).unwrap();

        let loaded = MappingStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            loaded.get("asset-2", "test-usage-2", "test-proto").unwrap().credential_id,
            "Test-mapping"
        );
    }
}
