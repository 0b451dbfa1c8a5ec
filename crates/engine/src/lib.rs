//! Slot-filling dialog engine
//!
//! Decides, turn by turn, whether a conversation has covered all of its
//! required topics and which follow-up prompt to show next:
//! - `DialogController`: the per-turn state machine
//! - `ConversationStateStore`: sharded per-conversation state with atomic
//!   read-modify-write per conversation id
//! - `SlotPredictor`: boundary to the external classifier that can replace
//!   the static required-slot list for a new conversation

pub mod controller;
pub mod predictor;
pub mod response;
pub mod state_store;

pub use controller::{DialogController, TurnOutcome, TurnRequest};
pub use predictor::{HttpSlotPredictor, PredictError, PredictorConfig, SlotPredictor};
pub use response::{TurnResponse, WhatToSay};
pub use state_store::ConversationStateStore;

use faq_dialog_config::ConfigError;
use thiserror::Error;

/// Turn-fatal dialog errors.
///
/// Predictor failures and unknown-slot inconsistencies are recovered inside
/// the controller and never reach the caller.
#[derive(Error, Debug)]
pub enum DialogError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}
