//! Draft keys and the merge rule for restoring a stored draft.

use serde_json::{Map, Value};
use thiserror::Error;

const AUTO_RESTORE_SUFFIX: &str = ":auto_restore";

/// Storage keys of one draft: the payload key and its preference key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftKey {
    key: String,
    auto_restore_key: String,
}

impl DraftKey {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let auto_restore_key = format!("{key}{AUTO_RESTORE_SUFFIX}");
        Self {
            key,
            auto_restore_key,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn auto_restore_key(&self) -> &str {
        &self.auto_restore_key
    }
}

/// Why a stored draft could not be restored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftDecodeError {
    #[error("stored draft is not valid JSON: {0}")]
    Unparsable(String),

    #[error("stored draft is not a JSON object")]
    NotAnObject,
}

/// Parses a stored draft and lays its fields over `defaults`.
/// Stored fields win; fields only present in `defaults` are kept.
pub fn merge_over_defaults(
    defaults: &Map<String, Value>,
    raw: &str,
) -> Result<Map<String, Value>, DraftDecodeError> {
    let parsed: Value =
        serde_json::from_str(raw).map_err(|e| DraftDecodeError::Unparsable(e.to_string()))?;
    let Value::Object(stored) = parsed else {
        return Err(DraftDecodeError::NotAnObject);
    };
    let mut merged = defaults.clone();
    merged.extend(stored);
    Ok(merged)
}

/// Preference values are the literal strings `"true"` / `"false"`;
/// anything but `"false"` (including absence) means enabled.
pub fn parse_auto_restore(raw: Option<&str>) -> bool {
    raw != Some("false")
}

pub fn encode_auto_restore(enabled: bool) -> &'static str {
    if enabled { "true" } else { "false" }
}
