//! Budget model
//!
//! A budget caps spending in one expense category for one month. Budgets are
//! either personal or shared by a family group. Spending is not stored on the
//! budget; callers compute it from transactions and build a `BudgetSummary`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetId, BudgetTransferId, CategoryId, FamilyId, UserId};
use super::money::Money;
use super::month::Month;

/// Who a budget belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BudgetScope {
    Personal { user_id: UserId },
    Family { family_id: FamilyId },
}

impl BudgetScope {
    pub fn personal(user_id: UserId) -> Self {
        Self::Personal { user_id }
    }

    pub fn family(family_id: FamilyId) -> Self {
        Self::Family { family_id }
    }

    pub fn is_family(&self) -> bool {
        matches!(self, Self::Family { .. })
    }
}

impl fmt::Display for BudgetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Personal { .. } => f.pad("personal"),
            Self::Family { .. } => f.pad("family"),
        }
    }
}

/// A monthly spending limit for one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,

    pub scope: BudgetScope,

    pub category_id: CategoryId,

    pub month: Month,

    /// Spending limit for the month
    pub limit: Money,

    /// Percent of the limit at which the budget counts as near its limit
    pub alert_threshold: u8,

    #[serde(default)]
    pub notes: String,

    pub created_by: UserId,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(
        scope: BudgetScope,
        category_id: CategoryId,
        month: Month,
        limit: Money,
        alert_threshold: u8,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            scope,
            category_id,
            month,
            limit,
            alert_threshold,
            notes: String::new(),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// The uniqueness key: one budget per scope, category and month
    pub fn key(&self) -> (BudgetScope, CategoryId, Month) {
        (self.scope, self.category_id, self.month)
    }

    pub fn set_limit(&mut self, limit: Money) {
        self.limit = limit;
        self.updated_at = Utc::now();
    }

    pub fn set_alert_threshold(&mut self, threshold: u8) {
        self.alert_threshold = threshold;
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        if self.limit.is_negative() {
            return Err(BudgetValidationError::NegativeLimit);
        }

        if !(1..=100).contains(&self.alert_threshold) {
            return Err(BudgetValidationError::InvalidThreshold(self.alert_threshold));
        }

        Ok(())
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} limit: {}", self.scope, self.month, self.limit)
    }
}

/// Where a budget stands against its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    UnderBudget,
    NearLimit,
    OverBudget,
}

impl BudgetStatus {
    pub fn needs_attention(&self) -> bool {
        !matches!(self, Self::UnderBudget)
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnderBudget => f.pad("Under budget"),
            Self::NearLimit => f.pad("Near limit"),
            Self::OverBudget => f.pad("Over budget"),
        }
    }
}

/// A budget together with the month's spending in its category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub budget_id: BudgetId,
    pub scope: BudgetScope,
    pub category_id: CategoryId,
    pub month: Month,
    pub limit: Money,
    pub spent: Money,
    /// `limit - spent`; negative when overspent
    pub remaining: Money,
    pub percent_used: f64,
    pub status: BudgetStatus,
}

impl BudgetSummary {
    pub fn from_budget(budget: &Budget, spent: Money) -> Self {
        let percent_used = percent_used(budget.limit, spent);
        let status = if spent > budget.limit {
            BudgetStatus::OverBudget
        } else if percent_used >= budget.alert_threshold as f64 {
            BudgetStatus::NearLimit
        } else {
            BudgetStatus::UnderBudget
        };

        Self {
            budget_id: budget.id,
            scope: budget.scope,
            category_id: budget.category_id,
            month: budget.month,
            limit: budget.limit,
            spent,
            remaining: budget.limit - spent,
            percent_used,
            status,
        }
    }

    /// Unspent part of the limit, never negative
    pub fn available(&self) -> Money {
        self.remaining.max(Money::zero())
    }
}

/// Spending as a percentage of the limit
///
/// A zero limit reads as 0% until anything is spent, then as 100%.
fn percent_used(limit: Money, spent: Money) -> f64 {
    if limit.is_zero() {
        if spent.is_positive() {
            100.0
        } else {
            0.0
        }
    } else {
        spent.percent_of(limit)
    }
}

/// A recorded move of limit from one budget to another
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetTransfer {
    pub id: BudgetTransferId,
    pub scope: BudgetScope,
    pub month: Month,
    pub from_budget: BudgetId,
    pub to_budget: BudgetId,
    pub amount: Money,
    #[serde(default)]
    pub note: String,
    pub performed_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl BudgetTransfer {
    pub fn new(
        from: &Budget,
        to: &Budget,
        amount: Money,
        note: impl Into<String>,
        performed_by: UserId,
    ) -> Self {
        Self {
            id: BudgetTransferId::new(),
            scope: from.scope,
            month: from.month,
            from_budget: from.id,
            to_budget: to.id,
            amount,
            note: note.into(),
            performed_by,
            created_at: Utc::now(),
        }
    }
}

/// Validation errors for budgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetValidationError {
    NegativeLimit,
    InvalidThreshold(u8),
}

impl fmt::Display for BudgetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeLimit => write!(f, "Budget limit cannot be negative"),
            Self::InvalidThreshold(t) => {
                write!(f, "Alert threshold must be between 1 and 100 (got {})", t)
            }
        }
    }
}

impl std::error::Error for BudgetValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(limit: i64, threshold: u8) -> Budget {
        Budget::new(
            BudgetScope::personal(UserId::new()),
            CategoryId::new(),
            Month::new(2025, 1).unwrap(),
            Money::from_cents(limit),
            threshold,
            UserId::new(),
        )
    }

    #[test]
    fn test_status_thresholds() {
        let b = budget(10000, 80);

        let under = BudgetSummary::from_budget(&b, Money::from_cents(5000));
        assert_eq!(under.status, BudgetStatus::UnderBudget);
        assert_eq!(under.remaining, Money::from_cents(5000));
        assert_eq!(under.percent_used, 50.0);

        let near = BudgetSummary::from_budget(&b, Money::from_cents(8000));
        assert_eq!(near.status, BudgetStatus::NearLimit);

        let exact = BudgetSummary::from_budget(&b, Money::from_cents(10000));
        assert_eq!(exact.status, BudgetStatus::NearLimit);
        assert_eq!(exact.remaining, Money::zero());

        let over = BudgetSummary::from_budget(&b, Money::from_cents(12000));
        assert_eq!(over.status, BudgetStatus::OverBudget);
        assert_eq!(over.remaining, Money::from_cents(-2000));
        assert_eq!(over.available(), Money::zero());
    }

    #[test]
    fn test_zero_limit() {
        let b = budget(0, 80);
        let idle = BudgetSummary::from_budget(&b, Money::zero());
        assert_eq!(idle.percent_used, 0.0);
        assert_eq!(idle.status, BudgetStatus::UnderBudget);

        let spent = BudgetSummary::from_budget(&b, Money::from_cents(1));
        assert_eq!(spent.percent_used, 100.0);
        assert_eq!(spent.status, BudgetStatus::OverBudget);
    }

    #[test]
    fn test_validation() {
        assert!(budget(100, 80).validate().is_ok());
        assert_eq!(
            budget(-1, 80).validate(),
            Err(BudgetValidationError::NegativeLimit)
        );
        assert_eq!(
            budget(100, 0).validate(),
            Err(BudgetValidationError::InvalidThreshold(0))
        );
        assert!(budget(100, 101).validate().is_err());
    }

    #[test]
    fn test_scope_serialization() {
        let scope = BudgetScope::family(FamilyId::new());
        let json = serde_json::to_string(&scope).unwrap();
        assert!(json.contains("\"type\":\"family\""));
        let back: BudgetScope = serde_json::from_str(&json).unwrap();
        assert_eq!(scope, back);
    }
}
