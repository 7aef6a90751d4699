//! Credential-Asset Mapping Server: an ungated dispatcher over the
//! mapping store. Any caller may read and mutate any mapping; there is
//! no sender-based gating.

use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::{json, Value};
use tracing::instrument;

use crate::mapping::error::{CamsError, CamsResult};
use crate::mapping::store::{Mapping, MappingStatus, MappingStore, MappingStoreError};

pub struct CredentialAssetMappingServer {
    store: Mutex<MappingStore>,
    db_path: PathBuf,
}

fn arg_str<'a>(args: &'a [Value], idx: usize, command: &str) -> CamsResult<&'a str> {
    args.get(idx)
        .and_then(Value::as_str)
        .ok_or_else(|| CamsError::BadCommandArgument {
            command: command.to_string(),
            reason: format!("missing or non-string argument at position {idx}"),
        })
}

fn triple_error(mapping: &Mapping, err: MappingStoreError) -> CamsError {
    match err {
        MappingStoreError::AlreadyExists => CamsError::MappingAlreadyExists {
            asset_id: mapping.asset_id.clone(),
            service_id: mapping.service_id.clone(),
            protocol: mapping.protocol.clone(),
        },
        MappingStoreError::DoesNotExist => CamsError::MappingDoesNotExist {
            asset_id: mapping.asset_id.clone(),
            service_id: mapping.service_id.clone(),
            protocol: mapping.protocol.clone(),
        },
    }
}

impl CredentialAssetMappingServer {
    pub fn new(store: MappingStore, db_path: PathBuf) -> Self {
        Self {
            store: Mutex::new(store),
            db_path,
        }
    }

    #[instrument(skip(self, args), fields(command))]
    pub fn handle(&self, command: &str, args: &[Value]) -> CamsResult<Value> {
        match command {
            "ERROR" | "OK" => Ok(Value::Null),
            "CREATE_MAPPING" => self.create_mapping(args),
            "GET_MAPPING" => self.get_mapping(args),
            "UPDATE_MAPPING" => self.update_mapping(args),
            "UPDATE_PORT_MAPPING" => self.update_field(
                args,
                "UPDATE_PORT_MAPPING",
                |m, incoming| m.port = incoming.port.clone(),
                true,
            ),
            "UPDATE_CREDENTIAL_MAPPING" => self.update_field(
                args,
                "UPDATE_CREDENTIAL_MAPPING",
                |m, incoming| m.credential_id = incoming.credential_id.clone(),
                true,
            ),
            "UPDATE_STATUS_MAPPING" => self.update_status(args),
            "UPDATE_INFO_MAPPING" => self.update_info(args),
            "REMOVE_MAPPING" => self.remove_mapping(args),
            "GET_ASSET_MAPPINGS" => self.get_asset_mappings(args),
            "GET_MAPPINGS" => self.get_mappings(args),
            "GET_ALL_MAPPINGS" => self.get_all_mappings(),
            "GET_CRED_MAPPINGS" => self.get_cred_mappings(args),
            "COUNT_CRED_MAPPINGS" => self.count_cred_mappings(args),
            "GET_VERSION" => Ok(json!(env!("CARGO_PKG_VERSION"))),
            other => Err(CamsError::UnsupportedCommand(other.to_string())),
        }
    }

    fn persist(&self, store: &MappingStore) -> CamsResult<()> {
        store
            .save(&self.db_path)
            .map_err(|e| CamsError::Generic(format!("persisting mapping database: {e}")))
    }

    fn create_mapping(&self, args: &[Value]) -> CamsResult<Value> {
        let value = args.first().ok_or_else(|| CamsError::BadCommandArgument {
            command: "CREATE_MAPPING".to_string(),
            reason: "missing mapping argument".to_string(),
        })?;
        let mapping: Mapping = serde_json::from_value(value.clone()).map_err(|e| CamsError::MappingInvalid {
            field: e.to_string(),
        })?;
        mapping
            .validate()
            .map_err(|field| CamsError::MappingInvalid { field: field.to_string() })?;

        let mut store = self.store.lock().expect("mutation lock poisoned");
        store.insert(mapping.clone()).map_err(|e| triple_error(&mapping, e))?;
        self.persist(&store)?;
        Ok(Value::Null)
    }

    fn get_mapping(&self, args: &[Value]) -> CamsResult<Value> {
        let (asset, service, protocol) = triple_args(args, "GET_MAPPING")?;
        let store = self.store.lock().expect("mutation lock poisoned");
        let mapping = store.get(asset, service, protocol).ok_or_else(|| CamsError::MappingDoesNotExist {
            asset_id: asset.to_string(),
            service_id: service.to_string(),
            protocol: protocol.to_string(),
        })?;
        Ok(serde_json::to_value(mapping).expect("serializable"))
    }

    fn update_mapping(&self, args: &[Value]) -> CamsResult<Value> {
        let value = args.first().ok_or_else(|| CamsError::BadCommandArgument {
            command: "UPDATE_MAPPING".to_string(),
            reason: "missing mapping argument".to_string(),
        })?;
        let mapping: Mapping = serde_json::from_value(value.clone()).map_err(|e| CamsError::MappingInvalid {
            field: e.to_string(),
        })?;
        mapping
            .validate()
            .map_err(|field| CamsError::MappingInvalid { field: field.to_string() })?;

        let mut store = self.store.lock().expect("mutation lock poisoned");
        store.replace(mapping.clone()).map_err(|e| triple_error(&mapping, e))?;
        self.persist(&store)?;
        Ok(Value::Null)
    }

    /// Shared machinery for `UPDATE_PORT_MAPPING` / `UPDATE_CREDENTIAL_MAPPING`:
    /// the caller sends a full mapping object; only the field `apply`
    /// copies over is applied to the existing record, everything else
    /// in the argument is ignored.
    fn update_field(
        &self,
        args: &[Value],
        command: &str,
        apply: impl FnOnce(&mut Mapping, &Mapping),
        reset_status: bool,
    ) -> CamsResult<Value> {
        let value = args.first().ok_or_else(|| CamsError::BadCommandArgument {
            command: command.to_string(),
            reason: "missing mapping argument".to_string(),
        })?;
        let incoming = mapping_from_value(value, command)?;

        let mut store = self.store.lock().expect("mutation lock poisoned");
        let updated = store
            .modify(&incoming.asset_id, &incoming.service_id, &incoming.protocol, |m| {
                apply(m, &incoming);
                if reset_status {
                    m.status = MappingStatus::Unknown;
                }
            })
            .map_err(|_| CamsError::MappingDoesNotExist {
                asset_id: incoming.asset_id.clone(),
                service_id: incoming.service_id.clone(),
                protocol: incoming.protocol.clone(),
            })?;
        self.persist(&store)?;
        Ok(serde_json::to_value(updated).expect("serializable"))
    }

    fn update_status(&self, args: &[Value]) -> CamsResult<Value> {
        let value = args.first().ok_or_else(|| CamsError::BadCommandArgument {
            command: "UPDATE_STATUS_MAPPING".to_string(),
            reason: "missing mapping argument".to_string(),
        })?;
        let incoming = mapping_from_value(value, "UPDATE_STATUS_MAPPING")?;

        let mut store = self.store.lock().expect("mutation lock poisoned");
        let updated = store
            .modify(&incoming.asset_id, &incoming.service_id, &incoming.protocol, |m| {
                m.status = incoming.status;
            })
            .map_err(|_| CamsError::MappingDoesNotExist {
                asset_id: incoming.asset_id.clone(),
                service_id: incoming.service_id.clone(),
                protocol: incoming.protocol.clone(),
            })?;
        self.persist(&store)?;
        Ok(serde_json::to_value(updated).expect("serializable"))
    }

    fn update_info(&self, args: &[Value]) -> CamsResult<Value> {
        let value = args.first().ok_or_else(|| CamsError::BadCommandArgument {
            command: "UPDATE_INFO_MAPPING".to_string(),
            reason: "missing mapping argument".to_string(),
        })?;
        let incoming = mapping_from_value(value, "UPDATE_INFO_MAPPING")?;

        let mut store = self.store.lock().expect("mutation lock poisoned");
        let updated = store
            .modify(&incoming.asset_id, &incoming.service_id, &incoming.protocol, |m| {
                m.extended_info = incoming.extended_info.clone();
            })
            .map_err(|_| CamsError::MappingDoesNotExist {
                asset_id: incoming.asset_id.clone(),
                service_id: incoming.service_id.clone(),
                protocol: incoming.protocol.clone(),
            })?;
        self.persist(&store)?;
        Ok(serde_json::to_value(updated).expect("serializable"))
    }

    fn remove_mapping(&self, args: &[Value]) -> CamsResult<Value> {
        let (asset, service, protocol) = triple_args(args, "REMOVE_MAPPING")?;
        let mut store = self.store.lock().expect("mutation lock poisoned");
        store
            .remove(asset, service, protocol)
            .map_err(|_| CamsError::MappingDoesNotExist {
                asset_id: asset.to_string(),
                service_id: service.to_string(),
                protocol: protocol.to_string(),
            })?;
        self.persist(&store)?;
        Ok(Value::Null)
    }

    fn get_asset_mappings(&self, args: &[Value]) -> CamsResult<Value> {
        let asset = arg_str(args, 0, "GET_ASSET_MAPPINGS")?;
        let store = self.store.lock().expect("mutation lock poisoned");
        Ok(json!(store.by_asset(asset)))
    }

    fn get_mappings(&self, args: &[Value]) -> CamsResult<Value> {
        let asset = arg_str(args, 0, "GET_MAPPINGS")?;
        let service = arg_str(args, 1, "GET_MAPPINGS")?;
        let store = self.store.lock().expect("mutation lock poisoned");
        Ok(json!(store.by_asset_and_service(asset, service)))
    }

    fn get_all_mappings(&self) -> CamsResult<Value> {
        let store = self.store.lock().expect("mutation lock poisoned");
        Ok(json!(store.all()))
    }

    fn get_cred_mappings(&self, args: &[Value]) -> CamsResult<Value> {
        let credential = arg_str(args, 0, "GET_CRED_MAPPINGS")?;
        let store = self.store.lock().expect("mutation lock poisoned");
        Ok(json!(store.by_credential(credential)))
    }

    fn count_cred_mappings(&self, args: &[Value]) -> CamsResult<Value> {
        let credential = arg_str(args, 0, "COUNT_CRED_MAPPINGS")?;
        let store = self.store.lock().expect("mutation lock poisoned");
        Ok(json!(store.by_credential(credential).len()))
    }
}

fn triple_args<'a>(args: &'a [Value], command: &str) -> CamsResult<(&'a str, &'a str, &'a str)> {
    Ok((
        arg_str(args, 0, command)?,
        arg_str(args, 1, command)?,
        arg_str(args, 2, command)?,
    ))
}

fn mapping_from_value(value: &Value, command: &str) -> CamsResult<Mapping> {
    serde_json::from_value(value.clone()).map_err(|e| CamsError::BadCommandArgument {
        command: command.to_string(),
        reason: format!("invalid mapping: {e}"),
    })
}
