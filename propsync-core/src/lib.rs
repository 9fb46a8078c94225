//! propsync core library: domain types, configuration, errors.
//!
//! - [`types`]: newtypes, records and operations
//! - [`config`]: layered configuration and validation
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigLayer, Secret, SourceConfig, StoreConfig, SyncConfig};
pub use error::ConfigError;
pub use types::{ExternalId, ExternalRecord, Operation, OperationKind, StoreRecord};
