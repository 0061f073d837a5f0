//! Filesystem utilities for atomic writes.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Rename `temp_path` over `destination`, retrying once after removing the
/// destination on platforms where rename refuses to replace an existing file.
///
/// The temp file is removed if the retry also fails.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

/// Write `data` to `path` through a synced sibling temp file and an atomic rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let temp_path = sibling_temp_path(path)?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)?;
    if let Err(err) = file.write_all(data).and_then(|_| file.sync_all()) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    rename_with_fallback(&temp_path, path)
}

/// Copy `source` to `destination` atomically, creating parent directories.
///
/// Returns the number of bytes copied.
pub fn copy_atomic(source: &Path, destination: &Path) -> io::Result<u64> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let temp_path = sibling_temp_path(destination)?;
    let bytes = fs::copy(source, &temp_path).inspect_err(|_| {
        let _ = fs::remove_file(&temp_path);
    })?;
    rename_with_fallback(&temp_path, destination)?;
    Ok(bytes)
}

fn sibling_temp_path(path: &Path) -> io::Result<std::path::PathBuf> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid file name"))?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::other(format!("System time error: {}", e)))?
        .as_nanos();
    let temp_name = format!(".{}.{}.tmp", filename, nanos);
    Ok(match path.parent() {
        Some(parent) => parent.join(temp_name),
        None => std::path::PathBuf::from(temp_name),
    })
}
