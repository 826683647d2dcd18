//! Storage layer for fintrack
//!
//! One JSON file per repository under `data/`, written atomically. The
//! `Storage` coordinator owns every repository plus the audit logger, so a
//! service holding `&Storage` can read, write and audit in one place.

pub mod budgets;
pub mod categories;
pub mod file_io;
pub mod init;
pub mod plans;
pub mod repository;
pub mod transactions;
pub mod users;

pub use budgets::BudgetRepository;
pub use categories::CategoryRepository;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use plans::{FamilyRepository, GoalRepository, LiabilityRepository};
pub use repository::{JsonRepository, Record};
pub use transactions::TransactionRepository;
pub use users::{SessionRepository, UserRepository};

use serde::Serialize;

use crate::audit::{generate_diff, AuditEntry, AuditLogger, EntityType};
use crate::config::paths::FintrackPaths;
use crate::error::FintrackResult;
use crate::models::UserId;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: FintrackPaths,
    pub users: UserRepository,
    pub sessions: SessionRepository,
    pub categories: CategoryRepository,
    pub transactions: TransactionRepository,
    pub budgets: BudgetRepository,
    pub goals: GoalRepository,
    pub liabilities: LiabilityRepository,
    pub families: FamilyRepository,
    audit: AuditLogger,
}

impl Storage {
    /// Create a storage instance (nothing is read until `load_all`)
    pub fn new(paths: FintrackPaths) -> FintrackResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            users: UserRepository::new(paths.users_file()),
            sessions: SessionRepository::new(paths.sessions_file()),
            categories: CategoryRepository::new(paths.categories_file()),
            transactions: TransactionRepository::new(paths.transactions_file()),
            budgets: BudgetRepository::new(paths.budgets_file(), paths.budget_transfers_file()),
            goals: GoalRepository::new(paths.goals_file()),
            liabilities: LiabilityRepository::new(paths.liabilities_file()),
            families: FamilyRepository::new(paths.families_file()),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    /// Open storage at `paths`, seeding it on first use, and load everything
    pub fn open(paths: FintrackPaths) -> FintrackResult<Self> {
        initialize_storage(&paths)?;
        let mut storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    pub fn paths(&self) -> &FintrackPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn load_all(&mut self) -> FintrackResult<()> {
        self.users.load()?;
        self.sessions.load()?;
        self.categories.load()?;
        self.transactions.load()?;
        self.budgets.load()?;
        self.goals.load()?;
        self.liabilities.load()?;
        self.families.load()?;
        tracing::debug!(
            users = self.users.count()?,
            transactions = self.transactions.count()?,
            "storage loaded"
        );
        Ok(())
    }

    pub fn save_all(&self) -> FintrackResult<()> {
        self.users.save()?;
        self.sessions.save()?;
        self.categories.save()?;
        self.transactions.save()?;
        self.budgets.save()?;
        self.goals.save()?;
        self.liabilities.save()?;
        self.families.save()?;
        Ok(())
    }

    /// Check if storage has been initialized (settings file exists)
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    pub fn log_create<T: Serialize>(
        &self,
        actor: Option<UserId>,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> FintrackResult<()> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity).by(actor))
    }

    /// Audit an update; the diff summary is computed from the two snapshots
    pub fn log_update<T: Serialize>(
        &self,
        actor: Option<UserId>,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> FintrackResult<()> {
        let diff = match (serde_json::to_value(before), serde_json::to_value(after)) {
            (Ok(b), Ok(a)) => generate_diff(&b, &a),
            _ => None,
        };
        self.audit.log(
            &AuditEntry::update(entity_type, entity_id, entity_name, before, after, diff)
                .by(actor),
        )
    }

    pub fn log_delete<T: Serialize>(
        &self,
        actor: Option<UserId>,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> FintrackResult<()> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity).by(actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use crate::models::{Category, CategoryKind};
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FintrackPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(!storage.is_initialized());
    }

    #[test]
    fn test_open_seeds_and_loads() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FintrackPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();

        assert!(storage.is_initialized());
        assert_eq!(
            storage.categories.count().unwrap(),
            Category::builtins().len()
        );
    }

    #[test]
    fn test_save_all_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FintrackPaths::with_base_dir(temp_dir.path().to_path_buf());
        let user = UserId::new();
        {
            let storage = Storage::open(paths.clone()).unwrap();
            storage
                .categories
                .upsert(Category::new("Pets", CategoryKind::Expense, user))
                .unwrap();
            storage.save_all().unwrap();
        }

        let storage = Storage::open(paths).unwrap();
        assert_eq!(storage.categories.get_by_owner(user).unwrap().len(), 1);
    }

    #[test]
    fn test_audit_helpers() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FintrackPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        let actor = UserId::new();

        let before = Category::new("Pets", CategoryKind::Expense, actor);
        let mut after = before.clone();
        after.name = "Animals".into();

        storage
            .log_create(Some(actor), EntityType::Category, before.id.to_string(), None, &before)
            .unwrap();
        storage
            .log_update(Some(actor), EntityType::Category, before.id.to_string(), None, &before, &after)
            .unwrap();

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].operation, Operation::Update);
        assert_eq!(
            entries[1].diff_summary.as_deref(),
            Some("name: \"Pets\" -> \"Animals\"")
        );
        assert_eq!(entries[1].actor, Some(actor));
    }
}
