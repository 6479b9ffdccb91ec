//! Atomic file replacement for the cache and history files.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PersistenceError, Result};

/// Replaces the content of `path` with `data`.
///
/// Missing parent directories are created. The data goes to a temp file
/// next to the target first and is renamed over it, so readers see either
/// the old or the new content, never a partial file.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(dir).map_err(|source| PersistenceError::DirectoryError {
        path: dir.to_path_buf(),
        source,
    })?;

    let write_err = |source| PersistenceError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    temp_file.write_all(data).map_err(write_err)?;
    temp_file.flush().map_err(write_err)?;
    temp_file
        .persist(path)
        .map_err(|e| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source: e.error,
        })?;

    Ok(())
}

/// Writes `value` as pretty-printed JSON (two-space indentation).
pub fn atomic_write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_vec_pretty(value)?;
    json.push(b'\n');
    atomic_write(path, &json)
}

/// Reads a file, returning `None` if it does not exist.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PersistenceError::ReadError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reads and deserializes JSON, returning `None` if the file doesn't exist.
pub fn read_json_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match read_optional(path)? {
        Some(data) => Ok(Some(serde_json::from_str(&data)?)),
        None => Ok(None),
    }
}

/// Reads a JSON array file as raw values.
///
/// A missing file, an empty file or a whitespace-only file is an empty
/// array. Anything that is not an array is rejected.
pub fn read_json_array(path: &Path) -> Result<Vec<serde_json::Value>> {
    let data = match read_optional(path)? {
        Some(data) if !data.trim().is_empty() => data,
        _ => return Ok(Vec::new()),
    };

    match serde_json::from_str::<serde_json::Value>(&data)? {
        serde_json::Value::Array(items) => Ok(items),
        other => Err(PersistenceError::InvalidData {
            path: path.to_path_buf(),
            reason: format!("expected a JSON array, found {}", json_type(&other)),
        }),
    }
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".gonx/benchmarks/build-benchmarks.json");

        atomic_write(&path, b"[]").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");

        atomic_write(&path, b"old content that is longer").unwrap();
        atomic_write(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_pretty_json_uses_two_spaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        atomic_write_json(&path, &json!([{"appName": "shop"}])).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  {\n    \"appName\": \"shop\"\n  }"));
    }

    #[test]
    fn test_read_json_array_missing_or_empty() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(read_json_array(&missing).unwrap().is_empty());

        let empty = dir.path().join("empty.json");
        fs::write(&empty, "  \n").unwrap();
        assert!(read_json_array(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_read_json_array_rejects_objects() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("object.json");
        fs::write(&path, r#"{"id": 1}"#).unwrap();

        let err = read_json_array(&path).unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidData { .. }));
    }

    #[test]
    fn test_read_json_optional() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("value.json");

        let missing: Option<Vec<u32>> = read_json_optional(&path).unwrap();
        assert!(missing.is_none());

        atomic_write_json(&path, &vec![1u32, 2, 3]).unwrap();
        let loaded: Option<Vec<u32>> = read_json_optional(&path).unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));
    }
}
