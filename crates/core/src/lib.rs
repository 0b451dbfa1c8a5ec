//! Core types for the FAQ dialog manager
//!
//! Shared by the config, engine and server crates:
//! - Slot types (`SlotKey`, `SlotDefinition`, `SlotConfig`)
//! - Conversation state (`ConversationState`)
//! - Tenant addressing (`TenantRef`)

pub mod conversation;
pub mod slot;
pub mod tenant;

pub use conversation::ConversationState;
pub use slot::{SlotConfig, SlotConfigError, SlotDefinition, SlotKey, CATCH_ALL_KEY};
pub use tenant::TenantRef;
