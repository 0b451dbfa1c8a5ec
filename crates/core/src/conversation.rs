//! Conversation state
//!
//! The remaining (unresolved) slot list for one active conversation. Created
//! on the first turn, shrunk by each turn, removed once every slot has been
//! resolved. State lives only for the active conversation, never across
//! process restart.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::slot::SlotKey;

/// Per-conversation dialog state, keyed by conversation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Slot keys not yet confirmed, in asking order
    pub outstanding: Vec<SlotKey>,
    /// Sticky flag: some turn of this conversation asked the opening
    /// question (the first entry of the configured required list)
    pub first_question: bool,
}

impl ConversationState {
    pub fn new(outstanding: Vec<SlotKey>) -> Self {
        Self {
            outstanding,
            first_question: false,
        }
    }

    /// Remove the first occurrence of every detected key.
    ///
    /// Unrecognized keys match nothing and are ignored. A key listed twice in
    /// `outstanding` loses only its first occurrence.
    pub fn resolve_detected(&mut self, detected: &HashSet<SlotKey>) {
        for key in detected {
            if let Some(pos) = self.outstanding.iter().position(|k| k == key) {
                self.outstanding.remove(pos);
            }
        }
    }

    /// Remove the first occurrence of one key, if present.
    pub fn remove_first(&mut self, key: &SlotKey) {
        if let Some(pos) = self.outstanding.iter().position(|k| k == key) {
            self.outstanding.remove(pos);
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.outstanding.is_empty()
    }

    pub fn len(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }
}
