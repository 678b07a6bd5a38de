//! Contract source normalization.
//!
//! Block explorers return verified source in one of three shapes: flat text,
//! a single-brace solc "standard JSON input" document, or the same document
//! wrapped in an extra pair of braces. [`normalize_source`] turns any of them
//! into a single flat string that can be handed to a text-analysis consumer.
//!
//! Malformed bundles never fail normalization. They degrade to the raw text
//! and the returned [`NormalizedSource`] carries a warning for the caller to
//! log. The only error is [`NormalizeError::Empty`].

use serde::Serialize;
use serde_json::{Map, Value};

/// Marker placed between the contents of consecutive files of a bundle.
pub const FILE_SEPARATOR: &str = "\n\n// ---- Next File ----\n\n";

/// Payload shape, detected from the trimmed raw text. First match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceShape {
    /// `{{ ... }}`: standard JSON input wrapped in one extra layer of braces.
    DoubleBraceBundle,
    /// `{ ... }`: standard JSON input, or a bare map of file entries.
    SingleBraceBundle,
    /// Anything else. Already flat.
    FlatText,
}

impl SourceShape {
    pub fn detect(trimmed: &str) -> Self {
        if trimmed.starts_with("{{") && trimmed.ends_with("}}") {
            SourceShape::DoubleBraceBundle
        } else if trimmed.starts_with('{') && trimmed.ends_with('}') {
            SourceShape::SingleBraceBundle
        } else {
            SourceShape::FlatText
        }
    }
}

/// Result of a successful normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedSource {
    /// Flat, trimmed source text. Never empty.
    pub text: String,
    pub shape: SourceShape,
    /// Number of bundle entries that were concatenated. Zero when the raw text
    /// was used as is.
    pub files: usize,
    /// Set when a bundle could not be parsed and the raw text was kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Contract source is empty after normalization")]
    Empty,
}

/// Normalize a raw source payload into flat text.
///
/// The parse warning of a malformed bundle is dropped here. Callers that need
/// to surface it use [`normalize_source`].
pub fn normalize(raw: &str) -> Result<String, NormalizeError> {
    normalize_source(raw).map(|normalized| normalized.text)
}

/// Normalize a raw source payload, reporting the detected shape and any
/// recoverable parse failure alongside the flat text.
pub fn normalize_source(raw: &str) -> Result<NormalizedSource, NormalizeError> {
    let trimmed = raw.trim();
    let shape = SourceShape::detect(trimmed);

    let (text, files, warning) = match shape {
        SourceShape::DoubleBraceBundle => {
            // Only the outer layer is stripped; the remainder is itself a JSON object.
            let inner = &trimmed[1..trimmed.len() - 1];
            match serde_json::from_str::<Value>(inner) {
                Ok(value) => flatten(trimmed, double_brace_entries(&value)),
                Err(e) => (
                    trimmed.to_string(),
                    0,
                    Some(format!(
                        "Failed to parse multi-file source bundle, using raw source: {e}"
                    )),
                ),
            }
        }
        SourceShape::SingleBraceBundle => match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => flatten(trimmed, single_brace_entries(&value)),
            Err(e) => (
                trimmed.to_string(),
                0,
                Some(format!(
                    "Failed to parse potential JSON source, using raw source: {e}"
                )),
            ),
        },
        SourceShape::FlatText => (trimmed.to_string(), 0, None),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(NormalizeError::Empty);
    }

    Ok(NormalizedSource {
        text: text.to_string(),
        shape,
        files,
        warning,
    })
}

/// Join recognized bundle entries, or keep the raw text. A `null` entry has
/// no content to read, so the whole bundle falls back to the raw text.
fn flatten(trimmed: &str, entries: Option<Vec<&Value>>) -> (String, usize, Option<String>) {
    match entries {
        None => (trimmed.to_string(), 0, None),
        Some(entries) if entries.iter().any(|entry| entry.is_null()) => (
            trimmed.to_string(),
            0,
            Some("Source bundle has a null file entry, using raw source".to_string()),
        ),
        Some(entries) => (join_entries(&entries), entries.len(), None),
    }
}

/// A `sources` object wins; otherwise every top-level value is an entry.
fn double_brace_entries(value: &Value) -> Option<Vec<&Value>> {
    let object = value.as_object()?;
    match object.get("sources") {
        Some(Value::Object(sources)) => Some(sources.values().collect()),
        Some(_) => None,
        None => Some(object.values().collect()),
    }
}

/// A `sources` object wins; otherwise the document is only accepted when it
/// looks like a bare map of file entries, each exposing a string `content`.
fn single_brace_entries(value: &Value) -> Option<Vec<&Value>> {
    let object = value.as_object()?;
    if let Some(Value::Object(sources)) = object.get("sources") {
        return Some(sources.values().collect());
    }
    if !object.contains_key("sources") && is_file_map(object) {
        return Some(object.values().collect());
    }
    None
}

fn is_file_map(object: &Map<String, Value>) -> bool {
    !object.is_empty()
        && object
            .values()
            .all(|entry| entry.get("content").is_some_and(Value::is_string))
}

/// Entries without a string `content` contribute an empty string, so the
/// separator count always matches the entry count.
fn join_entries(entries: &[&Value]) -> String {
    entries
        .iter()
        .map(|entry| entry.get("content").and_then(Value::as_str).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(FILE_SEPARATOR)
}
