//! Slot config document parsing
//!
//! A slot config document is a JSON object with a `required` array, one
//! entry per slot key mapping to either `["heading", "optionsCsv"]` or a
//! bare heading string, and a `"Catch All"` entry:
//!
//! ```json
//! {
//!     "required": ["Vaccine", "Who is writing this"],
//!     "Vaccine": ["What vaccine are you talking about ?", "none, polio, measles"],
//!     "Who is writing this": "For whom is this question being asked ?",
//!     "Catch All": "Is there any additional information you could help us with ?"
//! }
//! ```
//!
//! An optional keyword catalogue (`SlotKey -> [token...]`) can be merged in
//! afterwards to synthesize the selectable options per slot.

use std::collections::HashMap;

use serde_json::Value;

use faq_dialog_core::{SlotConfig, SlotDefinition, SlotKey, CATCH_ALL_KEY};

use crate::ConfigError;

const REQUIRED_FIELD: &str = "required";

/// Parse one slot config document from its JSON text.
pub fn parse_document(json: &str) -> Result<SlotConfig, ConfigError> {
    let doc: serde_json::Map<String, Value> = serde_json::from_str(json)?;

    let required = match doc.get(REQUIRED_FIELD) {
        Some(value) => parse_required(value)?,
        None => return Err(ConfigError::Parse(format!("missing `{REQUIRED_FIELD}` array"))),
    };

    let mut definitions = HashMap::new();
    for (key, value) in &doc {
        if key == REQUIRED_FIELD {
            continue;
        }
        definitions.insert(SlotKey::from(key.as_str()), parse_definition(key, value)?);
    }

    Ok(SlotConfig::new(
        required,
        definitions,
        SlotKey::from(CATCH_ALL_KEY),
    )?)
}

fn parse_required(value: &Value) -> Result<Vec<SlotKey>, ConfigError> {
    let entries = value
        .as_array()
        .ok_or_else(|| ConfigError::Parse(format!("`{REQUIRED_FIELD}` must be an array")))?;

    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(SlotKey::from)
                .ok_or_else(|| ConfigError::Parse(format!("non-string entry in `{REQUIRED_FIELD}`")))
        })
        .collect()
}

/// A definition entry is a bare heading string or a `[heading, optionsCsv]`
/// pair. A one-element array is accepted as heading-only.
fn parse_definition(key: &str, value: &Value) -> Result<SlotDefinition, ConfigError> {
    match value {
        Value::String(heading) => Ok(SlotDefinition::heading_only(heading)),
        Value::Array(parts) => {
            let heading = parts
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| ConfigError::Parse(format!("entry `{key}` is missing its heading")))?;
            match parts.get(1) {
                Some(options) => {
                    let csv = options.as_str().ok_or_else(|| {
                        ConfigError::Parse(format!("entry `{key}` has a non-string options field"))
                    })?;
                    Ok(SlotDefinition::with_options_csv(heading, csv))
                }
                None => Ok(SlotDefinition::heading_only(heading)),
            }
        }
        _ => Err(ConfigError::Parse(format!(
            "entry `{key}` must be a heading string or a [heading, options] pair"
        ))),
    }
}

/// Parse a keyword catalogue document (`SlotKey -> [token...]`).
pub fn parse_catalogue(json: &str) -> Result<HashMap<SlotKey, Vec<String>>, ConfigError> {
    let doc: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
    Ok(doc
        .into_iter()
        .map(|(key, tokens)| (SlotKey::from(key), tokens))
        .collect())
}

/// Merge a keyword catalogue into a slot config.
///
/// Every catalogued slot gets options `none, tok1, tok2, ...`. A catalogued
/// key absent from the base config falls back to the generated heading
/// `what is the <key>?`.
pub fn merge_catalogue(config: &mut SlotConfig, catalogue: &HashMap<SlotKey, Vec<String>>) {
    for (key, tokens) in catalogue {
        let heading = match config.definition(key) {
            Some(definition) => definition.heading.clone(),
            None => format!("what is the {key}?"),
        };

        let mut options = Vec::with_capacity(tokens.len() + 1);
        options.push("none".to_string());
        options.extend(tokens.iter().map(|t| t.trim().to_string()));

        config
            .definitions
            .insert(key.clone(), SlotDefinition { heading, options });
    }
    tracing::debug!(slots = catalogue.len(), "merged keyword catalogue into slot options");
}
