//! Generic JSON-file repository
//!
//! Most entities live in a single file as `{"records": [...]}` and are kept
//! in memory in an `RwLock<HashMap>` keyed by id. Entity-specific lookups are
//! added as inherent impls on the concrete `JsonRepository<T>` in the sibling
//! modules.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{FintrackError, FintrackResult};
use crate::models::UserId;

use super::file_io::{read_json, write_json_atomic};

/// An entity stored by a `JsonRepository`
pub trait Record: Clone + Serialize + DeserializeOwned {
    type Id: Copy + Eq + Hash + Ord + fmt::Display;

    fn id(&self) -> Self::Id;

    /// The user who owns the record, if ownership is per user
    fn owner(&self) -> Option<UserId> {
        None
    }
}

#[derive(Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct RecordFile<T> {
    #[serde(default = "Vec::new")]
    records: Vec<T>,
}

impl<T> Default for RecordFile<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

pub(crate) fn read_guard<T>(lock: &RwLock<T>) -> FintrackResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| FintrackError::Storage(format!("Failed to acquire read lock: {}", e)))
}

pub(crate) fn write_guard<T>(lock: &RwLock<T>) -> FintrackResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| FintrackError::Storage(format!("Failed to acquire write lock: {}", e)))
}

/// Records sorted by id so saved files diff cleanly
pub(crate) fn sorted_records<T: Record>(data: &HashMap<T::Id, T>) -> Vec<T> {
    let mut records: Vec<T> = data.values().cloned().collect();
    records.sort_by_key(|r| r.id());
    records
}

pub(crate) fn write_records<T: Record>(path: &Path, records: Vec<T>) -> FintrackResult<()> {
    write_json_atomic(path, &RecordFile { records })
}

pub(crate) fn read_records<T: Record>(path: &Path) -> FintrackResult<Vec<T>> {
    let file: RecordFile<T> = read_json(path)?;
    Ok(file.records)
}

/// Repository for one entity type backed by one JSON file
pub struct JsonRepository<T: Record> {
    path: PathBuf,
    data: RwLock<HashMap<T::Id, T>>,
}

impl<T: Record> JsonRepository<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Replace the in-memory state with the file contents
    pub fn load(&self) -> FintrackResult<()> {
        let records = read_records::<T>(&self.path)?;
        let mut data = write_guard(&self.data)?;
        data.clear();
        for record in records {
            data.insert(record.id(), record);
        }
        Ok(())
    }

    /// Write the in-memory state to disk
    ///
    /// Holds the write lock for the whole write. If the write fails, memory is
    /// reset to what the file still holds, so unsaved changes are dropped.
    pub fn save(&self) -> FintrackResult<()> {
        let mut data = write_guard(&self.data)?;
        if let Err(e) = write_records(&self.path, sorted_records(&data)) {
            if let Ok(records) = read_records::<T>(&self.path) {
                data.clear();
                for record in records {
                    data.insert(record.id(), record);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn get(&self, id: T::Id) -> FintrackResult<Option<T>> {
        let data = read_guard(&self.data)?;
        Ok(data.get(&id).cloned())
    }

    /// Every record, ordered by id
    pub fn all(&self) -> FintrackResult<Vec<T>> {
        let data = read_guard(&self.data)?;
        Ok(sorted_records(&data))
    }

    /// Records matching `predicate`, ordered by id
    pub fn filter<F>(&self, predicate: F) -> FintrackResult<Vec<T>>
    where
        F: Fn(&T) -> bool,
    {
        let data = read_guard(&self.data)?;
        let mut records: Vec<T> = data.values().filter(|r| predicate(r)).cloned().collect();
        records.sort_by_key(|r| r.id());
        Ok(records)
    }

    /// First record matching `predicate`
    pub fn find<F>(&self, predicate: F) -> FintrackResult<Option<T>>
    where
        F: Fn(&T) -> bool,
    {
        let data = read_guard(&self.data)?;
        Ok(data.values().find(|r| predicate(r)).cloned())
    }

    pub fn get_by_owner(&self, owner: UserId) -> FintrackResult<Vec<T>> {
        self.filter(|r| r.owner() == Some(owner))
    }

    /// Insert or replace a record
    pub fn upsert(&self, record: T) -> FintrackResult<()> {
        let mut data = write_guard(&self.data)?;
        data.insert(record.id(), record);
        Ok(())
    }

    /// Remove a record, returning it if it existed
    pub fn delete(&self, id: T::Id) -> FintrackResult<Option<T>> {
        let mut data = write_guard(&self.data)?;
        Ok(data.remove(&id))
    }

    /// Remove every record matching `predicate`, returning how many went
    pub fn delete_where<F>(&self, predicate: F) -> FintrackResult<usize>
    where
        F: Fn(&T) -> bool,
    {
        let mut data = write_guard(&self.data)?;
        let before = data.len();
        data.retain(|_, r| !predicate(r));
        Ok(before - data.len())
    }

    pub fn count(&self) -> FintrackResult<usize> {
        let data = read_guard(&self.data)?;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Goal, GoalKind, Money};
    use tempfile::TempDir;

    fn repo(temp_dir: &TempDir) -> JsonRepository<Goal> {
        JsonRepository::new(temp_dir.path().join("goals.json"))
    }

    fn goal(user: UserId, name: &str) -> Goal {
        Goal::new(user, name, GoalKind::Other, Money::from_cents(10_000), None)
    }

    #[test]
    fn test_upsert_get_delete() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir);
        let g = goal(UserId::new(), "Bike");

        repo.upsert(g.clone()).unwrap();
        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.get(g.id).unwrap().unwrap().name, "Bike");

        let removed = repo.delete(g.id).unwrap();
        assert!(removed.is_some());
        assert!(repo.get(g.id).unwrap().is_none());
        assert!(repo.delete(g.id).unwrap().is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let user = UserId::new();
        {
            let repo = repo(&temp_dir);
            repo.upsert(goal(user, "Bike")).unwrap();
            repo.upsert(goal(user, "Trip")).unwrap();
            repo.save().unwrap();
        }

        let repo = repo(&temp_dir);
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 2);
        assert_eq!(repo.get_by_owner(user).unwrap().len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir);
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_filter_and_delete_where() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir);
        let alice = UserId::new();
        let bob = UserId::new();
        repo.upsert(goal(alice, "Car")).unwrap();
        repo.upsert(goal(alice, "House")).unwrap();
        repo.upsert(goal(bob, "Boat")).unwrap();

        assert_eq!(repo.filter(|g| g.user_id == alice).unwrap().len(), 2);
        assert_eq!(
            repo.find(|g| g.name == "Boat").unwrap().unwrap().user_id,
            bob
        );

        assert_eq!(repo.delete_where(|g| g.user_id == alice).unwrap(), 2);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_failed_save_drops_unsaved_changes() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the data directory should be
        let blocked = temp_dir.path().join("blocked");
        std::fs::write(&blocked, b"").unwrap();
        let repo: JsonRepository<Goal> = JsonRepository::new(blocked.join("goals.json"));

        repo.upsert(goal(UserId::new(), "Trip")).unwrap();
        assert!(matches!(repo.save(), Err(FintrackError::Storage(_))));

        // Memory matches the (empty) file again
        assert_eq!(repo.count().unwrap(), 0);
    }
}
