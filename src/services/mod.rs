//! Service layer for fintrack
//!
//! Services hold business rules on top of the storage layer: validation,
//! ownership and family permissions, computed summaries and auditing. Each is
//! a thin struct borrowing `&Storage` (plus `&Settings` where policy knobs
//! matter) so they are cheap to build per command or per request.

pub mod auth;
pub mod budget;
pub mod category;
pub mod family;
pub mod goal;
pub mod import;
pub mod insights;
pub mod liability;
pub mod transaction;
pub mod user;

pub use auth::{AuthService, LoginOutcome, RegisterInput};
pub use budget::{BudgetOverview, BudgetService, BudgetTotals, CreateBudgetInput};
pub use category::CategoryService;
pub use family::{FamilyService, MemberSpending, PendingInvitation};
pub use goal::{CreateGoalInput, GoalProgress, GoalService, UpdateGoalInput};
pub use import::{ImportPreview, ImportPreviewEntry, ImportResult, ImportService, ImportStatus};
pub use insights::{
    CategoryTrend, HealthScore, InsightService, ScoreComponent, SpendingAnomaly, SpendingCluster,
};
pub use liability::{
    CreateLiabilityInput, DebtSummary, LiabilityService, PayoffStrategy, UpdateLiabilityInput,
};
pub use transaction::{
    CategoryTotal, CreateTransactionInput, MonthlySummary, TransactionFilter, TransactionService,
    UpdateTransactionInput,
};
pub use user::UserService;

use crate::error::FintrackResult;
use crate::models::{FamilyGroup, UserId};
use crate::storage::Storage;

/// The users whose data `user_id` shares: the user plus their family members
pub(crate) fn household(storage: &Storage, user_id: UserId) -> FintrackResult<Vec<UserId>> {
    Ok(match storage.families.find_by_member(user_id)? {
        Some(family) => family.member_ids(),
        None => vec![user_id],
    })
}

pub(crate) fn family_of(storage: &Storage, user_id: UserId) -> FintrackResult<Option<FamilyGroup>> {
    storage.families.find_by_member(user_id)
}

#[cfg(test)]
pub(crate) mod testing {
    use tempfile::TempDir;

    use crate::config::paths::FintrackPaths;
    use crate::config::settings::Settings;
    use crate::models::User;
    use crate::storage::Storage;

    use super::auth::{AuthService, RegisterInput};

    pub fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = FintrackPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    pub fn register(storage: &Storage, username: &str) -> User {
        let settings = Settings::default();
        AuthService::new(storage, &settings)
            .register(RegisterInput {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                display_name: None,
                password: "password123".into(),
            })
            .unwrap()
    }
}
