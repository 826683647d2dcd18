//! Transaction repository for JSON storage
//!
//! Keeps secondary indexes by user and by category so per-user listings and
//! budget spending lookups don't scan every transaction.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::error::FintrackResult;
use crate::models::{CategoryId, Transaction, TransactionId, UserId};

use super::repository::{read_guard, read_records, write_guard, write_records, Record};

impl Record for Transaction {
    type Id = TransactionId;

    fn id(&self) -> TransactionId {
        self.id
    }

    fn owner(&self) -> Option<UserId> {
        Some(self.user_id)
    }
}

#[derive(Default)]
struct Indexes {
    by_user: HashMap<UserId, Vec<TransactionId>>,
    by_category: HashMap<CategoryId, Vec<TransactionId>>,
}

impl Indexes {
    fn add(&mut self, txn: &Transaction) {
        self.by_user.entry(txn.user_id).or_default().push(txn.id);
        self.by_category
            .entry(txn.category_id)
            .or_default()
            .push(txn.id);
    }

    fn remove(&mut self, txn: &Transaction) {
        if let Some(ids) = self.by_user.get_mut(&txn.user_id) {
            ids.retain(|id| *id != txn.id);
        }
        if let Some(ids) = self.by_category.get_mut(&txn.category_id) {
            ids.retain(|id| *id != txn.id);
        }
    }
}

/// Newest first; ties broken by creation time so listings are stable
fn sort_newest_first(txns: &mut [Transaction]) {
    txns.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Repository for transaction persistence with indexing
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
    indexes: RwLock<Indexes>,
}

impl TransactionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            indexes: RwLock::new(Indexes::default()),
        }
    }

    /// Load transactions from disk and rebuild the indexes
    pub fn load(&self) -> FintrackResult<()> {
        let records: Vec<Transaction> = read_records(&self.path)?;

        let mut data = write_guard(&self.data)?;
        let mut indexes = write_guard(&self.indexes)?;
        data.clear();
        *indexes = Indexes::default();

        for txn in records {
            indexes.add(&txn);
            data.insert(txn.id, txn);
        }
        Ok(())
    }

    /// Save transactions to disk, oldest first
    ///
    /// On a failed write, memory and indexes are rebuilt from the file.
    pub fn save(&self) -> FintrackResult<()> {
        let mut data = write_guard(&self.data)?;
        let mut txns: Vec<Transaction> = data.values().cloned().collect();
        txns.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));

        if let Err(e) = write_records(&self.path, txns) {
            if let Ok(records) = read_records::<Transaction>(&self.path) {
                let mut indexes = write_guard(&self.indexes)?;
                data.clear();
                *indexes = Indexes::default();
                for txn in records {
                    indexes.add(&txn);
                    data.insert(txn.id, txn);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn get(&self, id: TransactionId) -> FintrackResult<Option<Transaction>> {
        let data = read_guard(&self.data)?;
        Ok(data.get(&id).cloned())
    }

    /// All transactions, newest first
    pub fn get_all(&self) -> FintrackResult<Vec<Transaction>> {
        let data = read_guard(&self.data)?;
        let mut txns: Vec<Transaction> = data.values().cloned().collect();
        sort_newest_first(&mut txns);
        Ok(txns)
    }

    /// A user's transactions, newest first
    pub fn get_by_user(&self, user_id: UserId) -> FintrackResult<Vec<Transaction>> {
        let data = read_guard(&self.data)?;
        let indexes = read_guard(&self.indexes)?;

        let mut txns: Vec<Transaction> = indexes
            .by_user
            .get(&user_id)
            .map(|ids| ids.iter().filter_map(|id| data.get(id).cloned()).collect())
            .unwrap_or_default();
        sort_newest_first(&mut txns);
        Ok(txns)
    }

    pub fn get_by_category(&self, category_id: CategoryId) -> FintrackResult<Vec<Transaction>> {
        let data = read_guard(&self.data)?;
        let indexes = read_guard(&self.indexes)?;

        let mut txns: Vec<Transaction> = indexes
            .by_category
            .get(&category_id)
            .map(|ids| ids.iter().filter_map(|id| data.get(id).cloned()).collect())
            .unwrap_or_default();
        sort_newest_first(&mut txns);
        Ok(txns)
    }

    /// Transactions of any of `users` dated within `start..=end`, newest first
    pub fn get_for_users_in_range(
        &self,
        users: &[UserId],
        start: NaiveDate,
        end: NaiveDate,
    ) -> FintrackResult<Vec<Transaction>> {
        let data = read_guard(&self.data)?;
        let indexes = read_guard(&self.indexes)?;

        let users: HashSet<&UserId> = users.iter().collect();
        let mut txns: Vec<Transaction> = users
            .iter()
            .filter_map(|u| indexes.by_user.get(*u))
            .flatten()
            .filter_map(|id| data.get(id))
            .filter(|t| t.date >= start && t.date <= end)
            .cloned()
            .collect();
        sort_newest_first(&mut txns);
        Ok(txns)
    }

    /// Count transactions filed under a category
    pub fn count_by_category(&self, category_id: CategoryId) -> FintrackResult<usize> {
        let indexes = read_guard(&self.indexes)?;
        Ok(indexes
            .by_category
            .get(&category_id)
            .map(Vec::len)
            .unwrap_or(0))
    }

    /// Find a user's transaction by import id (for duplicate detection)
    pub fn find_by_import_id(
        &self,
        user_id: UserId,
        import_id: &str,
    ) -> FintrackResult<Option<Transaction>> {
        let data = read_guard(&self.data)?;
        let indexes = read_guard(&self.indexes)?;

        Ok(indexes.by_user.get(&user_id).and_then(|ids| {
            ids.iter()
                .filter_map(|id| data.get(id))
                .find(|t| t.import_id.as_deref() == Some(import_id))
                .cloned()
        }))
    }

    /// Insert or update a transaction, keeping the indexes in step
    pub fn upsert(&self, txn: Transaction) -> FintrackResult<()> {
        let mut data = write_guard(&self.data)?;
        let mut indexes = write_guard(&self.indexes)?;

        if let Some(old) = data.get(&txn.id) {
            indexes.remove(old);
        }
        indexes.add(&txn);
        data.insert(txn.id, txn);
        Ok(())
    }

    pub fn delete(&self, id: TransactionId) -> FintrackResult<Option<Transaction>> {
        let mut data = write_guard(&self.data)?;
        let mut indexes = write_guard(&self.indexes)?;

        let removed = data.remove(&id);
        if let Some(txn) = &removed {
            indexes.remove(txn);
        }
        Ok(removed)
    }

    /// Delete every transaction recorded by `user_id`
    pub fn delete_by_user(&self, user_id: UserId) -> FintrackResult<usize> {
        let mut data = write_guard(&self.data)?;
        let mut indexes = write_guard(&self.indexes)?;

        let ids = indexes.by_user.remove(&user_id).unwrap_or_default();
        for id in &ids {
            if let Some(txn) = data.remove(id) {
                if let Some(cat_ids) = indexes.by_category.get_mut(&txn.category_id) {
                    cat_ids.retain(|c| c != id);
                }
            }
        }
        Ok(ids.len())
    }

    pub fn count(&self) -> FintrackResult<usize> {
        let data = read_guard(&self.data)?;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FintrackError;
    use crate::models::Money;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, TransactionRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("transactions.json");
        (temp_dir, TransactionRepository::new(path))
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn expense(user: UserId, cat: CategoryId, cents: i64, day: NaiveDate) -> Transaction {
        Transaction::expense(user, Money::from_cents(cents), cat, day, "test")
    }

    #[test]
    fn test_indexes_follow_updates() {
        let (_temp_dir, repo) = create_test_repo();
        let user = UserId::new();
        let food = CategoryId::new();
        let fun = CategoryId::new();

        let mut txn = expense(user, food, 1200, date(1, 5));
        repo.upsert(txn.clone()).unwrap();
        assert_eq!(repo.count_by_category(food).unwrap(), 1);

        txn.category_id = fun;
        repo.upsert(txn.clone()).unwrap();
        assert_eq!(repo.count_by_category(food).unwrap(), 0);
        assert_eq!(repo.get_by_category(fun).unwrap().len(), 1);
        assert_eq!(repo.get_by_user(user).unwrap().len(), 1);

        repo.delete(txn.id).unwrap();
        assert!(repo.get_by_user(user).unwrap().is_empty());
    }

    #[test]
    fn test_newest_first_and_range() {
        let (_temp_dir, repo) = create_test_repo();
        let alice = UserId::new();
        let bob = UserId::new();
        let cat = CategoryId::new();

        repo.upsert(expense(alice, cat, 100, date(1, 1))).unwrap();
        repo.upsert(expense(alice, cat, 200, date(1, 20))).unwrap();
        repo.upsert(expense(bob, cat, 300, date(1, 10))).unwrap();
        repo.upsert(expense(bob, cat, 400, date(2, 1))).unwrap();

        let all = repo.get_all().unwrap();
        assert_eq!(all[0].date, date(2, 1));

        let january = repo
            .get_for_users_in_range(&[alice, bob], date(1, 1), date(1, 31))
            .unwrap();
        let cents: Vec<i64> = january.iter().map(|t| t.amount.cents()).collect();
        assert_eq!(cents, vec![200, 300, 100]);

        let only_bob = repo
            .get_for_users_in_range(&[bob], date(1, 1), date(12, 31))
            .unwrap();
        assert_eq!(only_bob.len(), 2);
    }

    #[test]
    fn test_import_id_lookup_is_per_user() {
        let (_temp_dir, repo) = create_test_repo();
        let alice = UserId::new();
        let bob = UserId::new();
        let mut txn = expense(alice, CategoryId::new(), 500, date(3, 3));
        txn.import_id = Some("imp-1".into());
        repo.upsert(txn.clone()).unwrap();

        assert_eq!(
            repo.find_by_import_id(alice, "imp-1").unwrap().unwrap().id,
            txn.id
        );
        assert!(repo.find_by_import_id(bob, "imp-1").unwrap().is_none());
    }

    #[test]
    fn test_save_load_and_delete_by_user() {
        let (temp_dir, repo) = create_test_repo();
        let user = UserId::new();
        let cat = CategoryId::new();
        repo.upsert(expense(user, cat, 100, date(1, 1))).unwrap();
        repo.upsert(expense(user, cat, 200, date(1, 2))).unwrap();
        repo.save().unwrap();

        let reloaded = TransactionRepository::new(temp_dir.path().join("transactions.json"));
        reloaded.load().unwrap();
        assert_eq!(reloaded.count().unwrap(), 2);
        assert_eq!(reloaded.count_by_category(cat).unwrap(), 2);

        assert_eq!(reloaded.delete_by_user(user).unwrap(), 2);
        assert_eq!(reloaded.count().unwrap(), 0);
        assert_eq!(reloaded.count_by_category(cat).unwrap(), 0);
    }

    #[test]
    fn test_failed_save_rebuilds_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let blocked = temp_dir.path().join("blocked");
        std::fs::write(&blocked, b"").unwrap();
        let repo = TransactionRepository::new(blocked.join("transactions.json"));
        let user = UserId::new();
        let cat = CategoryId::new();

        repo.upsert(expense(user, cat, 100, date(1, 1))).unwrap();
        assert!(matches!(repo.save(), Err(FintrackError::Storage(_))));

        assert_eq!(repo.count().unwrap(), 0);
        assert!(repo.get_by_user(user).unwrap().is_empty());
        assert_eq!(repo.count_by_category(cat).unwrap(), 0);
    }
}
