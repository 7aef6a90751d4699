//! Credential-Asset Mapping Server: ungated CRUD over
//! `(asset_id, service_id, protocol)` mappings.

pub mod error;
pub mod server;
pub mod store;

pub use error::{CamsError, CamsErrorCode, CamsResult};
pub use server::CredentialAssetMappingServer;
pub use store::{Mapping, MappingStatus, MappingStore};
