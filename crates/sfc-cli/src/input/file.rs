use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use sfc_core::SfcError;

/// Read a contract or request JSON file.
pub fn read_json_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let resolved = resolve_path(path)?;
    let contents = fs::read_to_string(&resolved)
        .map_err(|e| format!("Failed to read '{}': {}", resolved.display(), e))?;
    tracing::debug!(path = %resolved.display(), bytes = contents.len(), "input loaded");
    let value = serde_json::from_str(&contents).map_err(|e| SfcError::InvalidInput {
        field: resolved.display().to_string(),
        reason: format!("not valid JSON ({e})"),
    })?;
    Ok(value)
}

/// Resolve relative paths against the working directory.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let resolved = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !resolved.is_file() {
        return Err(SfcError::MissingInput(format!(
            "contract file not found: {}",
            resolved.display()
        ))
        .into());
    }

    Ok(resolved)
}
