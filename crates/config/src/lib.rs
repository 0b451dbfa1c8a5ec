//! Slot configuration for the FAQ dialog manager
//!
//! Loads per-(project, version) slot config documents, optionally merges a
//! keyword catalogue into the slot options, and serves the resulting
//! immutable `SlotConfig` records to the dialog engine.
//!
//! Loading happens once at startup (or explicitly per tenant); nothing here
//! mutates a config after it has been registered.

pub mod document;
pub mod store;

pub use document::{merge_catalogue, parse_catalogue, parse_document};
pub use store::SlotConfigStore;

use faq_dialog_core::{SlotConfigError, TenantRef};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no slot config for tenant {0}")]
    NotFound(TenantRef),

    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse slot config: {0}")]
    Parse(String),

    #[error("invalid slot config: {0}")]
    Invalid(#[from] SlotConfigError),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
