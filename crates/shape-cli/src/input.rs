//! # Document Loading
//!
//! Schema, data and configuration files are JSON, or YAML when the file
//! extension is `.yaml` or `.yml`.

use std::path::Path;

use anyhow::Context;
use serde_json::Value;
use shape_core::ConfigFile;

/// Returns `true` if `path` has a YAML extension.
pub fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Read a JSON or YAML document.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub fn load_document(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let value = if is_yaml(path) {
        serde_yaml::from_str(&text).with_context(|| format!("invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))?
    };
    tracing::debug!(path = %path.display(), "loaded document");
    Ok(value)
}

/// Read a validator configuration file.
///
/// # Errors
///
/// Fails if the file cannot be read or does not describe a [`ConfigFile`].
pub fn load_config(path: &Path) -> anyhow::Result<ConfigFile> {
    let document = load_document(path)?;
    serde_json::from_value(document)
        .with_context(|| format!("invalid validator configuration in {}", path.display()))
}
