//! JSON file helpers
//!
//! Every repository file is written through `write_json_atomic`, so a crash
//! mid-write leaves the previous contents in place.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::error::{FintrackError, FintrackResult};

fn storage_error(action: &str, path: &Path, err: impl std::fmt::Display) -> FintrackError {
    FintrackError::Storage(format!("Failed to {} {}: {}", action, path.display(), err))
}

fn parse_file<T: DeserializeOwned>(path: &Path) -> FintrackResult<T> {
    let file = File::open(path).map_err(|e| storage_error("open", path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| storage_error("parse", path, e))
}

/// Read JSON from a file, falling back to `T::default()` when it is missing
pub fn read_json<T, P>(path: P) -> FintrackResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(T::default());
    }
    parse_file(path)
}

/// Read JSON from a file that must exist
pub fn read_json_required<T, P>(path: P) -> FintrackResult<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Err(FintrackError::Storage(format!(
            "File not found: {}",
            path.display()
        )));
    }
    parse_file(path)
}

/// Write JSON atomically: unique temp file in the same directory, fsync, rename
pub fn write_json_atomic<T, P>(path: P, data: &T) -> FintrackResult<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| storage_error("create directory", parent, e))?;

    // Same directory so the rename cannot cross filesystems
    let temp = NamedTempFile::new_in(parent)
        .map_err(|e| storage_error("create temp file in", parent, e))?;

    let mut writer = BufWriter::new(temp);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| storage_error("serialize", path, e))?;
    let temp = writer
        .into_inner()
        .map_err(|e| storage_error("flush", path, e.error()))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| storage_error("sync", temp.path(), e))?;

    // A failed persist drops the temp file
    temp.persist(path)
        .map_err(|e| storage_error("replace", path, e.error))?;
    Ok(())
}

/// Delete a file, treating "already gone" as success
pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> FintrackResult<()> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(storage_error("remove", path, e)),
    }
}

/// True when the file exists and holds well-formed JSON
pub fn json_file_valid<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    path.exists() && parse_file::<serde_json::Value>(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Ledger {
        owner: String,
        entries: Vec<i64>,
    }

    fn sample() -> Ledger {
        Ledger {
            owner: "alice".into(),
            entries: vec![1250, -400],
        }
    }

    #[test]
    fn test_missing_file_reads_default() {
        let temp_dir = TempDir::new().unwrap();
        let data: Ledger = read_json(temp_dir.path().join("missing.json")).unwrap();
        assert_eq!(data, Ledger::default());
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.json");

        write_json_atomic(&path, &sample()).unwrap();
        let loaded: Ledger = read_json(&path).unwrap();

        assert_eq!(loaded, sample());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_concurrent_writes_to_one_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.json");

        std::thread::scope(|scope| {
            for n in 0..8i64 {
                let path = &path;
                scope.spawn(move || {
                    for i in 0..20 {
                        let ledger = Ledger {
                            owner: format!("writer-{}", n),
                            entries: vec![n, i],
                        };
                        write_json_atomic(path, &ledger).unwrap();
                    }
                });
            }
        });

        let loaded: Ledger = read_json_required(&path).unwrap();
        assert!(loaded.owner.starts_with("writer-"));
        // No temp files left behind
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("ledger.json");
        write_json_atomic(&path, &sample()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_required_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.json");
        assert!(read_json_required::<Ledger, _>(&path).is_err());

        write_json_atomic(&path, &sample()).unwrap();
        assert_eq!(read_json_required::<Ledger, _>(&path).unwrap(), sample());
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read_json::<Ledger, _>(&path).unwrap_err();
        assert!(matches!(err, FintrackError::Storage(_)));
        assert!(!json_file_valid(&path));
    }

    #[test]
    fn test_remove_if_exists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        remove_if_exists(&path).unwrap();

        fs::write(&path, "{}").unwrap();
        assert!(json_file_valid(&path));
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }
}
