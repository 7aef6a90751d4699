//! SWS error taxonomy and its wire projection: a typed, classified
//! error that knows how to render itself as the protocol's exception
//! JSON (`{errorCode, whatArg, extraData}`).

use serde_json::{json, Value};
use thiserror::Error;

use crate::document::DocumentError;

/// Numeric codes from the enumerated SWS taxonomy, in declaration
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwsErrorCode {
    Generic = 0,
    UnsupportedCommand = 1,
    ProtocolError = 2,
    BadCommandArgument = 3,
    UnknownDocumentType = 4,
    UnknownPortfolio = 5,
    InvalidDocumentFormat = 6,
    ImpossibleToLoadPortfolio = 7,
    UnknownTag = 8,
    DocumentDoesNotExist = 9,
    IllegalAccess = 10,
    UnknownUsageId = 11,
    NameAlreadyExists = 12,
    NameDoesNotExist = 13,
}

/// Errors a Security Wallet Server handler can raise.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwsError {
    #[error("generic error: {0}")]
    Generic(String),

    #[error("unsupported command '{0}'")]
    UnsupportedCommand(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("bad argument for command '{command}': {reason}")]
    BadCommandArgument { command: String, reason: String },

    #[error("unknown document type '{0}'")]
    UnknownDocumentType(String),

    #[error("unknown portfolio '{0}'")]
    UnknownPortfolio(String),

    #[error("invalid document format: {field}")]
    InvalidDocumentFormat { field: String },

    #[error("impossible to load portfolio '{portfolio}': {reason}")]
    ImpossibleToLoadPortfolio { portfolio: String, reason: String },

    #[error("unknown tag '{0}'")]
    UnknownTag(String),

    #[error("document '{0}' does not exist")]
    DocumentDoesNotExist(String),

    #[error("illegal access by '{sender}' to document '{document_id}'")]
    IllegalAccess { sender: String, document_id: String },

    #[error("unknown usage id '{0}'")]
    UnknownUsageId(String),

    #[error("name '{0}' already exists")]
    NameAlreadyExists(String),

    #[error("name '{0}' does not exist")]
    NameDoesNotExist(String),
}

impl From<DocumentError> for SwsError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::UnknownType(t) => SwsError::UnknownDocumentType(t),
            DocumentError::InvalidFormat { field } => SwsError::InvalidDocumentFormat { field },
        }
    }
}

impl SwsError {
    pub fn code(&self) -> SwsErrorCode {
        match self {
            Self::Generic(_) => SwsErrorCode::Generic,
            Self::UnsupportedCommand(_) => SwsErrorCode::UnsupportedCommand,
            Self::ProtocolError(_) => SwsErrorCode::ProtocolError,
            Self::BadCommandArgument { .. } => SwsErrorCode::BadCommandArgument,
            Self::UnknownDocumentType(_) => SwsErrorCode::UnknownDocumentType,
            Self::UnknownPortfolio(_) => SwsErrorCode::UnknownPortfolio,
            Self::InvalidDocumentFormat { .. } => SwsErrorCode::InvalidDocumentFormat,
            Self::ImpossibleToLoadPortfolio { .. } => SwsErrorCode::ImpossibleToLoadPortfolio,
            Self::UnknownTag(_) => SwsErrorCode::UnknownTag,
            Self::DocumentDoesNotExist(_) => SwsErrorCode::DocumentDoesNotExist,
            Self::IllegalAccess { .. } => SwsErrorCode::IllegalAccess,
            Self::UnknownUsageId(_) => SwsErrorCode::UnknownUsageId,
            Self::NameAlreadyExists(_) => SwsErrorCode::NameAlreadyExists,
            Self::NameDoesNotExist(_) => SwsErrorCode::NameDoesNotExist,
        }
    }

    /// The `extraData` object; its shape varies by error code.
    pub fn extra_data(&self) -> Value {
        match self {
            Self::Generic(_) | Self::ProtocolError(_) => json!({}),
            Self::UnsupportedCommand(command) => json!({ "command": command }),
            Self::BadCommandArgument { command, .. } => json!({ "command": command }),
            Self::UnknownDocumentType(t) => json!({ "type": t }),
            Self::UnknownPortfolio(p) => json!({ "portfolioName": p }),
            Self::InvalidDocumentFormat { field } => json!({ "field": field }),
            Self::ImpossibleToLoadPortfolio { portfolio, .. } => json!({ "portfolioName": portfolio }),
            Self::UnknownTag(tag) => json!({ "tag": tag }),
            Self::DocumentDoesNotExist(id) => json!({ "id": id }),
            Self::IllegalAccess { sender, document_id } => {
                json!({ "sender": sender, "id": document_id })
            }
            Self::UnknownUsageId(usage) => json!({ "usageId": usage }),
            Self::NameAlreadyExists(name) => json!({ "name": name }),
            Self::NameDoesNotExist(name) => json!({ "name": name }),
        }
    }

    /// Renders `{errorCode, whatArg, extraData}`.
    pub fn to_exception_json(&self) -> Value {
        json!({
            "errorCode": self.code() as i64,
            "whatArg": self.to_string(),
            "extraData": self.extra_data(),
        })
    }
}

pub type SwsResult<T> = Result<T, SwsError>;
