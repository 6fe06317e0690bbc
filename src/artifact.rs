use std::fs;
use std::io::Write;
use std::path::Path;

use log::debug;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Result, SnapshotError};

/// Persist `value` as pretty-printed JSON at `path`, replacing any previous
/// artifact.
///
/// The JSON goes to a temporary file in the same directory which is then
/// renamed over `path`, so readers never see a half-written artifact. Missing
/// parent directories are created.
pub fn write_artifact<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let write_error = |source: std::io::Error| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| write_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_error)?;

    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(json.as_bytes()).map_err(write_error)?;
    file.write_all(b"\n").map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    debug!("Wrote {} bytes to {}", json.len() + 1, path.display());
    Ok(())
}

/// Read an artifact back for assertions.
#[cfg(test)]
pub fn read_artifact<T>(path: &Path) -> serde_json::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let contents = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("artifact {} is missing: {e}", path.display()));
    serde_json::from_str(&contents)
}
