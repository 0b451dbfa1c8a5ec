//! Turn response payload
//!
//! Shape mirrors the wire format existing clients consume: the prompt block
//! carries the raw options string plus `option_N` fields, one per
//! comma-separated piece (trimmed, empty pieces kept, original order).

use serde::ser::{Serialize, SerializeMap, Serializer};

/// The prompt to show the user for the selected slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatToSay {
    /// Question heading
    pub heading: String,
    /// Raw comma-joined options string
    pub options: String,
}

impl WhatToSay {
    pub fn new(heading: impl Into<String>, options: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            options: options.into(),
        }
    }

    /// The indexed option pieces: the options string split on commas, each
    /// piece trimmed of surrounding whitespace. Splitting always yields at
    /// least one piece, so an empty options string exposes `option_0: ""`.
    pub fn option_pieces(&self) -> Vec<&str> {
        self.options.split(',').map(str::trim).collect()
    }
}

impl Serialize for WhatToSay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let pieces = self.option_pieces();
        let mut map = serializer.serialize_map(Some(2 + pieces.len()))?;
        map.serialize_entry("heading", &self.heading)?;
        map.serialize_entry("options", &self.options)?;
        for (idx, piece) in pieces.iter().enumerate() {
            map.serialize_entry(&format!("option_{idx}"), piece)?;
        }
        map.end()
    }
}

/// Structured decision returned for one turn.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TurnResponse {
    /// Whether a follow-up question must still be asked
    pub ask_more_question: bool,
    /// Conversation id, serialized as `user_id` for wire compatibility
    #[serde(rename = "user_id")]
    pub conversation_id: String,
    /// Whether the selected slot is the catch-all
    pub ask_catch_all: bool,
    /// Whether this flow has (ever) asked its opening question
    pub first_question: bool,
    /// Prompt for the selected slot (empty when the dialog is complete)
    pub what_to_say: WhatToSay,
}
