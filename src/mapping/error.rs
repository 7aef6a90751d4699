//! CAMS error taxonomy and its wire projection.

use serde_json::{json, Value};
use thiserror::Error;

/// Numeric codes from the enumerated CAMS taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CamsErrorCode {
    Generic = 0,
    UnsupportedCommand = 1,
    ProtocolError = 2,
    BadCommandArgument = 3,
    MappingDoesNotExist = 4,
    MappingAlreadyExists = 5,
    MappingInvalid = 6,
}

/// Errors a Credential-Asset Mapping Server handler can raise.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CamsError {
    #[error("generic error: {0}")]
    Generic(String),

    #[error("unsupported command '{0}'")]
    UnsupportedCommand(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("bad argument for command '{command}': {reason}")]
    BadCommandArgument { command: String, reason: String },

    #[error("mapping ({asset_id}, {service_id}, {protocol}) does not exist")]
    MappingDoesNotExist {
        asset_id: String,
        service_id: String,
        protocol: String,
    },

    #[error("mapping ({asset_id}, {service_id}, {protocol}) already exists")]
    MappingAlreadyExists {
        asset_id: String,
        service_id: String,
        protocol: String,
    },

    #[error("invalid mapping: {field}")]
    MappingInvalid { field: String },
}

impl CamsError {
    pub fn code(&self) -> CamsErrorCode {
        match self {
            Self::Generic(_) => CamsErrorCode::Generic,
            Self::UnsupportedCommand(_) => CamsErrorCode::UnsupportedCommand,
            Self::ProtocolError(_) => CamsErrorCode::ProtocolError,
            Self::BadCommandArgument { .. } => CamsErrorCode::BadCommandArgument,
            Self::MappingDoesNotExist { .. } => CamsErrorCode::MappingDoesNotExist,
            Self::MappingAlreadyExists { .. } => CamsErrorCode::MappingAlreadyExists,
            Self::MappingInvalid { .. } => CamsErrorCode::MappingInvalid,
        }
    }

    /// `extraData` shaped `{assetId, serviceId, protocol}` for mapping
    /// errors.
    pub fn extra_data(&self) -> Value {
        match self {
            Self::Generic(_) | Self::ProtocolError(_) => json!({}),
            Self::UnsupportedCommand(command) => json!({ "command": command }),
            Self::BadCommandArgument { command, .. } => json!({ "command": command }),
            Self::MappingDoesNotExist {
                asset_id,
                service_id,
                protocol,
            }
            | Self::MappingAlreadyExists {
                asset_id,
                service_id,
                protocol,
            } => json!({ "assetId": asset_id, "serviceId": service_id, "protocol": protocol }),
            Self::MappingInvalid { field } => json!({ "field": field }),
        }
    }

    pub fn to_exception_json(&self) -> Value {
        json!({
            "errorCode": self.code() as i64,
            "whatArg": self.to_string(),
            "extraData": self.extra_data(),
        })
    }
}

pub type CamsResult<T> = Result<T, CamsError>;
