//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't leave a partial file behind on
//! failure.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::VaultError;

/// Hidden temp file next to `path`, so the final rename stays on one filesystem
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

/// Write bytes to a file atomically (write to temp, sync, then rename)
pub fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> std::io::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp_path = temp_path_for(path);
    let result = File::create(&temp_path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()
    });

    result
        .and_then(|_| fs::rename(&temp_path, path))
        .inspect_err(|_| {
            let _ = fs::remove_file(&temp_path);
        })
}

/// Serialize to pretty JSON and write atomically
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), VaultError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let json = serde_json::to_vec_pretty(data)
        .map_err(|e| VaultError::Json(format!("Failed to serialize {}: {}", path.display(), e)))?;

    write_atomic(path, &json)
        .map_err(|e| VaultError::Io(format!("Failed to write {}: {}", path.display(), e)))
}
