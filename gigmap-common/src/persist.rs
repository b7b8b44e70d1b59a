//! Atomic file persistence
//!
//! Output files are replaced with a temp-file-then-rename sequence so a run
//! that aborts part way never leaves a truncated dataset behind.

use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Temp file used while writing `target` (`<name>.tmp` in the same directory)
pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    target.with_file_name(name)
}

/// Write raw bytes to `target` atomically, creating parent directories
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp = temp_path_for(target);
    std::fs::write(&temp, contents)?;

    if let Err(e) = std::fs::rename(&temp, target) {
        let _ = std::fs::remove_file(&temp);
        return Err(e.into());
    }

    debug!(path = %target.display(), bytes = contents.len(), "Wrote file atomically");
    Ok(())
}

/// Serialize `value` as pretty-printed JSON and write it atomically
pub fn write_json_atomic<T: Serialize + ?Sized>(target: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(target, json.as_bytes())
}

/// Read a JSON array, skipping elements that do not decode
///
/// The file itself must be a JSON array; a single bad element is logged and
/// dropped so it cannot take the rest of the records down with it.
pub fn read_json_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)?;
    let elements: Vec<serde_json::Value> = serde_json::from_str(&content)?;

    let mut records = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        match serde_json::from_value(element) {
            Ok(record) => records.push(record),
            Err(e) => warn!(path = %path.display(), index, "Skipping unreadable record: {}", e),
        }
    }
    Ok(records)
}
