//! JSON Export functionality
//!
//! Exports everything one user owns to JSON with schema versioning. Password
//! hashes and sessions are never exported.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FintrackError, FintrackResult};
use crate::models::{
    Budget, BudgetScope, Category, FamilyGroup, Goal, Liability, Transaction, UserId, UserProfile,
};
use crate::storage::Storage;

use super::write_error;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Snapshot of one user's data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserExport {
    /// Schema version for compatibility checking
    pub schema_version: String,
    pub exported_at: DateTime<Utc>,
    /// Application version that created the export
    pub app_version: String,

    pub user: UserProfile,
    /// Custom categories plus every built-in the data refers to
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    /// Personal budgets only; family budgets belong to the family
    pub budgets: Vec<Budget>,
    pub goals: Vec<Goal>,
    pub liabilities: Vec<Liability>,
    #[serde(default)]
    pub family: Option<FamilyGroup>,

    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub transaction_count: usize,
    pub budget_count: usize,
    pub goal_count: usize,
    pub liability_count: usize,
    pub earliest_transaction: Option<String>,
    pub latest_transaction: Option<String>,
}

impl UserExport {
    pub fn from_storage(storage: &Storage, user_id: UserId) -> FintrackResult<Self> {
        let user = storage
            .users
            .get(user_id)?
            .ok_or_else(|| FintrackError::user_not_found(user_id.to_string()))?;

        let mut transactions = storage.transactions.get_by_user(user_id)?;
        transactions.sort_by(|a, b| a.date.cmp(&b.date));
        let budgets = storage
            .budgets
            .get_for_scope(BudgetScope::personal(user_id), None)?;
        let goals = storage.goals.get_by_owner(user_id)?;
        let liabilities = storage.liabilities.get_by_owner(user_id)?;
        let family = storage.families.find_by_member(user_id)?;

        let referenced: HashSet<_> = transactions
            .iter()
            .map(|t| t.category_id)
            .chain(budgets.iter().map(|b| b.category_id))
            .collect();
        let categories =
            storage
                .categories
                .filter(|c| c.owner == Some(user_id) || referenced.contains(&c.id))?;

        let metadata = ExportMetadata {
            transaction_count: transactions.len(),
            budget_count: budgets.len(),
            goal_count: goals.len(),
            liability_count: liabilities.len(),
            earliest_transaction: transactions.first().map(|t| t.date.to_string()),
            latest_transaction: transactions.last().map(|t| t.date.to_string()),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            user: user.profile(),
            categories,
            transactions,
            budgets,
            goals,
            liabilities,
            family,
            metadata,
        })
    }

    /// Check the schema version and that every reference resolves
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let category_ids: HashSet<_> = self.categories.iter().map(|c| c.id).collect();

        for txn in &self.transactions {
            if txn.user_id != self.user.id {
                return Err(format!("Transaction {} belongs to another user", txn.id));
            }
            if !category_ids.contains(&txn.category_id) {
                return Err(format!(
                    "Transaction {} references unknown category {}",
                    txn.id, txn.category_id
                ));
            }
        }

        for budget in &self.budgets {
            if !category_ids.contains(&budget.category_id) {
                return Err(format!(
                    "Budget {} references unknown category {}",
                    budget.id, budget.category_id
                ));
            }
        }

        if self.metadata.transaction_count != self.transactions.len() {
            return Err("Metadata transaction count does not match".into());
        }

        Ok(())
    }
}

/// Export one user's data to JSON
pub fn export_user_json<W: Write>(
    storage: &Storage,
    user_id: UserId,
    writer: &mut W,
    pretty: bool,
) -> FintrackResult<()> {
    let export = UserExport::from_storage(storage, user_id)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(write_error)?;

    Ok(())
}

/// Read back and validate a JSON export
pub fn import_from_json(json_str: &str) -> FintrackResult<UserExport> {
    let export: UserExport =
        serde_json::from_str(json_str).map_err(|e| FintrackError::Import(e.to_string()))?;
    export.validate().map_err(FintrackError::Import)?;
    Ok(export)
}
