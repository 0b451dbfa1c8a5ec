//! Slot types
//!
//! A slot is a required topic that must be confirmed present in the user's
//! utterance before the dialog can conclude. Each (tenant, version) pair
//! carries one immutable `SlotConfig` describing its required slots, the
//! prompt shown for each, and the designated catch-all slot.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key of the catch-all entry in slot config documents.
pub const CATCH_ALL_KEY: &str = "Catch All";

/// Opaque identifier of a topic slot (e.g. "Vaccine").
///
/// Equality is case-sensitive exact match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotKey(String);

impl SlotKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlotKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for SlotKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl Borrow<str> for SlotKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Prompt shown when a slot is still unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDefinition {
    /// Question heading shown to the user
    pub heading: String,
    /// Selectable options, in display order (may be empty)
    #[serde(default)]
    pub options: Vec<String>,
}

impl SlotDefinition {
    /// Definition with a heading and no options.
    pub fn heading_only(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            options: Vec::new(),
        }
    }

    /// Definition from a heading and a comma-separated options string.
    ///
    /// Pieces are trimmed but kept even when empty, preserving the shape of
    /// the original catalogue string.
    pub fn with_options_csv(heading: impl Into<String>, options_csv: &str) -> Self {
        Self {
            heading: heading.into(),
            options: options_csv.split(',').map(|s| s.trim().to_string()).collect(),
        }
    }

    /// Options joined back into the comma-separated display string.
    pub fn options_csv(&self) -> String {
        self.options.join(", ")
    }
}

/// Slot configuration for one (tenant, version) pair.
///
/// Immutable after load. The catch-all slot is a sentinel final entry asked
/// only once every substantive slot has been resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Required slot keys, in asking order (no duplicates)
    pub required: Vec<SlotKey>,
    /// Prompt definition per slot key
    pub definitions: HashMap<SlotKey, SlotDefinition>,
    /// Designated catch-all slot key
    pub catch_all: SlotKey,
}

/// Slot config invariant violations, reported at load time.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SlotConfigError {
    #[error("duplicate key in required list: {0}")]
    DuplicateRequired(SlotKey),

    #[error("required slot {0} has no definition")]
    MissingDefinition(SlotKey),

    #[error("catch-all slot {0} has no definition")]
    MissingCatchAll(SlotKey),
}

impl SlotConfig {
    pub fn new(
        required: Vec<SlotKey>,
        definitions: HashMap<SlotKey, SlotDefinition>,
        catch_all: SlotKey,
    ) -> Result<Self, SlotConfigError> {
        let config = Self {
            required,
            definitions,
            catch_all,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the load-time invariants: no duplicate required keys, every
    /// required key has a definition, the catch-all has a definition.
    pub fn validate(&self) -> Result<(), SlotConfigError> {
        let mut seen = std::collections::HashSet::new();
        for key in &self.required {
            if !seen.insert(key) {
                return Err(SlotConfigError::DuplicateRequired(key.clone()));
            }
            if !self.definitions.contains_key(key) {
                return Err(SlotConfigError::MissingDefinition(key.clone()));
            }
        }
        if !self.definitions.contains_key(&self.catch_all) {
            return Err(SlotConfigError::MissingCatchAll(self.catch_all.clone()));
        }
        Ok(())
    }

    /// Look up a slot's prompt definition.
    pub fn definition(&self, key: &SlotKey) -> Option<&SlotDefinition> {
        self.definitions.get(key)
    }

    /// Definition of the catch-all slot.
    ///
    /// Guaranteed present once `validate` has passed.
    pub fn catch_all_definition(&self) -> Option<&SlotDefinition> {
        self.definitions.get(&self.catch_all)
    }

    /// First required slot, used to flag the opening question of a flow.
    pub fn first_required(&self) -> Option<&SlotKey> {
        self.required.first()
    }
}
