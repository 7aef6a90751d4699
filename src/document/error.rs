//! Errors raised while decoding or validating a document.

use thiserror::Error;

/// Failures that can occur while building, decoding or validating a
/// [`crate::document::Document`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// `secw_doc_type` did not match any known variant.
    #[error("unknown document type '{0}'")]
    UnknownType(String),

    /// A required field was missing, empty, or the wrong shape.
    #[error("invalid document format: {field}")]
    InvalidFormat {
        /// Name of the offending field, e.g. `community_name`.
        field: String,
    },
}
