//! Origin manifest loading.
//!
//! The manifest is JSONC: either a bare array of origin strings or an object
//! with an `"origins"` array.
//!
//! ```jsonc
//! {
//!   // shaders
//!   "origins": [
//!     "modrinth;sodium;fabric;1.21",
//!     "assume;fabric-api",
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use jsonc_parser::ParseOptions;
use serde_json::Value;
use tracing::debug;

use crate::error::ManifestError;

/// Default manifest file name.
pub const DEFAULT_MANIFEST: &str = "pack.jsonc";

/// Read the origin strings from a manifest file.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<String>, ManifestError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let origins = parse(&content)?;
    debug!("Loaded {} origins from {}", origins.len(), path.display());
    Ok(origins)
}

/// Extract origin strings from manifest text.
pub fn parse(content: &str) -> Result<Vec<String>, ManifestError> {
    let value = jsonc_parser::parse_to_serde_value(content, &ParseOptions::default())
        .map_err(|e| ManifestError::InvalidJsonc(e.to_string()))?
        .ok_or(ManifestError::WrongShape)?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("origins") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(ManifestError::WrongShape),
        },
        _ => return Err(ManifestError::WrongShape),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            Value::String(origin) => Ok(origin),
            _ => Err(ManifestError::NonStringEntry { index }),
        })
        .collect()
}
