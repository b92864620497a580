use std::path::{Path, PathBuf};

use mirror_core::ManifestEntry;
use serde_json::{json, Value};

use crate::persist::{AtomicFileWriter, PersistError};

/// Pretty JSON array of `{"filename", "name"}` objects, newline-terminated.
pub fn render_manifest(entries: &[ManifestEntry]) -> String {
    let manifest = Value::Array(
        entries
            .iter()
            .map(|entry| {
                json!({
                    "name": entry.name,
                    "filename": entry.filename,
                })
            })
            .collect(),
    );
    // Serializing a `Value` cannot fail.
    let mut text = serde_json::to_string_pretty(&manifest).unwrap_or_default();
    text.push('\n');
    text
}

/// Replace the manifest at `path` with `entries`.
pub fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> Result<PathBuf, PersistError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PersistError::OutputDir(format!("invalid manifest path {path:?}")))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    AtomicFileWriter::new(dir).write(filename, render_manifest(entries).as_bytes())
}
