//! Budget service
//!
//! Monthly per-category limits for a person or a whole family, their status
//! against actual spending, and transfers of limit between budgets.
//!
//! Authority: a personal budget is managed by its user; a family budget by
//! the family head. Every member may read the family's budgets.

use serde::Serialize;

use crate::audit::EntityType;
use crate::error::{FintrackError, FintrackResult};
use crate::models::{
    Budget, BudgetId, BudgetScope, BudgetStatus, BudgetSummary, BudgetTransfer, CategoryId,
    FamilyGroup, Money, Month, UserId,
};
use crate::storage::Storage;

use super::category::CategoryService;
use super::family_of;

/// Service for budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
}

/// Input for creating a budget
#[derive(Debug, Clone)]
pub struct CreateBudgetInput {
    pub scope: BudgetScope,
    pub category_id: CategoryId,
    pub month: Month,
    pub limit: Money,
    pub alert_threshold: u8,
    pub notes: String,
}

/// Totals across every budget of a scope and month
#[derive(Debug, Clone, Default, Serialize)]
pub struct BudgetTotals {
    pub limit: Money,
    pub spent: Money,
    pub remaining: Money,
    pub percent_used: f64,
    pub over_budget: usize,
    pub near_limit: usize,
}

impl BudgetTotals {
    fn from_summaries(summaries: &[BudgetSummary]) -> Self {
        let limit: Money = summaries.iter().map(|s| s.limit).sum();
        let spent: Money = summaries.iter().map(|s| s.spent).sum();
        Self {
            limit,
            spent,
            remaining: limit - spent,
            percent_used: spent.percent_of(limit),
            over_budget: summaries
                .iter()
                .filter(|s| s.status == BudgetStatus::OverBudget)
                .count(),
            near_limit: summaries
                .iter()
                .filter(|s| s.status == BudgetStatus::NearLimit)
                .count(),
        }
    }
}

/// Every budget of a scope for one month, with totals
#[derive(Debug, Clone, Serialize)]
pub struct BudgetOverview {
    pub scope: BudgetScope,
    pub month: Month,
    pub totals: BudgetTotals,
    pub summaries: Vec<BudgetSummary>,
}

impl<'a> BudgetService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn family(&self, family_id: crate::models::FamilyId) -> FintrackResult<FamilyGroup> {
        self.storage
            .families
            .get(family_id)?
            .ok_or_else(|| FintrackError::family_not_found(family_id.to_string()))
    }

    fn authorize_write(&self, actor: UserId, scope: BudgetScope) -> FintrackResult<()> {
        match scope {
            BudgetScope::Personal { user_id } if user_id == actor => Ok(()),
            BudgetScope::Personal { .. } => Err(FintrackError::Forbidden(
                "Personal budgets can only be managed by their owner".into(),
            )),
            BudgetScope::Family { family_id } => {
                if self.family(family_id)?.is_head(actor) {
                    Ok(())
                } else {
                    Err(FintrackError::Forbidden(
                        "Only the family head can manage family budgets".into(),
                    ))
                }
            }
        }
    }

    fn authorize_read(&self, actor: UserId, scope: BudgetScope) -> FintrackResult<()> {
        match scope {
            BudgetScope::Personal { user_id } if user_id == actor => Ok(()),
            BudgetScope::Personal { .. } => Err(FintrackError::Forbidden(
                "Cannot view another user's budgets".into(),
            )),
            BudgetScope::Family { family_id } => {
                if self.family(family_id)?.is_member(actor) {
                    Ok(())
                } else {
                    Err(FintrackError::Forbidden(
                        "Not a member of this family".into(),
                    ))
                }
            }
        }
    }

    /// The users whose spending counts against a scope's budgets
    fn scope_users(&self, scope: BudgetScope) -> FintrackResult<Vec<UserId>> {
        Ok(match scope {
            BudgetScope::Personal { user_id } => vec![user_id],
            BudgetScope::Family { family_id } => self.family(family_id)?.member_ids(),
        })
    }

    /// Scopes the actor can see: their own, plus their family's if any
    pub fn scopes_for(&self, actor: UserId) -> FintrackResult<Vec<BudgetScope>> {
        let mut scopes = vec![BudgetScope::personal(actor)];
        if let Some(family) = family_of(self.storage, actor)? {
            scopes.push(BudgetScope::family(family.id));
        }
        Ok(scopes)
    }

    /// The actor's personal scope, or their family's when `family` is set
    pub fn scope_for(&self, actor: UserId, family: bool) -> FintrackResult<BudgetScope> {
        if !family {
            return Ok(BudgetScope::personal(actor));
        }
        family_of(self.storage, actor)?
            .map(|f| BudgetScope::family(f.id))
            .ok_or_else(|| FintrackError::Family("You are not in a family group".into()))
    }

    /// Get a budget the actor may read
    ///
    /// Budgets the actor cannot read at all (another user's, or a family they
    /// are not in) are reported as missing.
    pub fn get(&self, actor: UserId, id: BudgetId) -> FintrackResult<Budget> {
        let missing = || FintrackError::budget_not_found(id.to_string());
        let budget = self.storage.budgets.get(id)?.ok_or_else(missing)?;
        match self.authorize_read(actor, budget.scope) {
            Ok(()) => Ok(budget),
            Err(e) if e.is_auth() || e.is_not_found() => Err(missing()),
            Err(e) => Err(e),
        }
    }

    /// Find a visible budget by full or short ID
    pub fn find(&self, actor: UserId, identifier: &str) -> FintrackResult<Budget> {
        if let Ok(id) = BudgetId::parse(identifier.trim()) {
            return self.get(actor, id);
        }
        for scope in self.scopes_for(actor)? {
            if let Some(budget) = self
                .storage
                .budgets
                .get_for_scope(scope, None)?
                .into_iter()
                .find(|b| b.id.matches_short(identifier))
            {
                return Ok(budget);
            }
        }
        Err(FintrackError::budget_not_found(identifier))
    }

    /// Find the budget for a category in a month, personal first
    pub fn find_for_category(
        &self,
        actor: UserId,
        category_id: CategoryId,
        month: Month,
    ) -> FintrackResult<Option<Budget>> {
        for scope in self.scopes_for(actor)? {
            if let Some(budget) = self.storage.budgets.find_by_key(scope, category_id, month)? {
                return Ok(Some(budget));
            }
        }
        Ok(None)
    }

    pub fn create(&self, actor: UserId, input: CreateBudgetInput) -> FintrackResult<Budget> {
        self.authorize_write(actor, input.scope)?;

        let category = CategoryService::new(self.storage).get(actor, input.category_id)?;
        if !category.kind.is_expense() {
            return Err(FintrackError::Validation(format!(
                "'{}' is an income category; budgets apply to expenses",
                category.name
            )));
        }

        if self
            .storage
            .budgets
            .find_by_key(input.scope, input.category_id, input.month)?
            .is_some()
        {
            return Err(FintrackError::Duplicate {
                entity_type: "Budget",
                identifier: format!("{} for {} ({})", category.name, input.month, input.scope),
            });
        }

        let mut budget = Budget::new(
            input.scope,
            input.category_id,
            input.month,
            input.limit,
            input.alert_threshold,
            actor,
        );
        budget.notes = input.notes.trim().to_string();
        budget
            .validate()
            .map_err(|e| FintrackError::Validation(e.to_string()))?;

        self.storage.budgets.upsert(budget.clone())?;
        self.storage.budgets.save()?;

        self.storage.log_create(
            Some(actor),
            EntityType::Budget,
            budget.id.to_string(),
            Some(format!("{} {}", category.name, budget.month)),
            &budget,
        )?;

        Ok(budget)
    }

    fn modify<F>(&self, actor: UserId, id: BudgetId, change: F) -> FintrackResult<Budget>
    where
        F: FnOnce(&mut Budget),
    {
        let mut budget = self.get(actor, id)?;
        self.authorize_write(actor, budget.scope)?;
        let before = budget.clone();

        change(&mut budget);
        budget
            .validate()
            .map_err(|e| FintrackError::Validation(e.to_string()))?;

        self.storage.budgets.upsert(budget.clone())?;
        self.storage.budgets.save()?;

        self.storage.log_update(
            Some(actor),
            EntityType::Budget,
            budget.id.to_string(),
            None,
            &before,
            &budget,
        )?;

        Ok(budget)
    }

    pub fn update_limit(&self, actor: UserId, id: BudgetId, limit: Money) -> FintrackResult<Budget> {
        self.modify(actor, id, |b| b.set_limit(limit))
    }

    pub fn update_threshold(
        &self,
        actor: UserId,
        id: BudgetId,
        threshold: u8,
    ) -> FintrackResult<Budget> {
        self.modify(actor, id, |b| b.set_alert_threshold(threshold))
    }

    pub fn delete(&self, actor: UserId, id: BudgetId) -> FintrackResult<Budget> {
        let budget = self.get(actor, id)?;
        self.authorize_write(actor, budget.scope)?;

        self.storage.budgets.delete(id)?;
        self.storage.budgets.save()?;

        self.storage.log_delete(
            Some(actor),
            EntityType::Budget,
            budget.id.to_string(),
            None,
            &budget,
        )?;

        Ok(budget)
    }

    /// Expense spending against a budget's category and month
    fn spent(&self, budget: &Budget) -> FintrackResult<Money> {
        let users = self.scope_users(budget.scope)?;
        Ok(self
            .storage
            .transactions
            .get_for_users_in_range(&users, budget.month.start_date(), budget.month.end_date())?
            .iter()
            .filter(|t| t.is_expense() && t.category_id == budget.category_id)
            .map(|t| t.amount)
            .sum())
    }

    pub fn summary(&self, budget: &Budget) -> FintrackResult<BudgetSummary> {
        Ok(BudgetSummary::from_budget(budget, self.spent(budget)?))
    }

    pub fn overview(
        &self,
        actor: UserId,
        scope: BudgetScope,
        month: Month,
    ) -> FintrackResult<BudgetOverview> {
        self.authorize_read(actor, scope)?;

        let summaries = self
            .storage
            .budgets
            .get_for_scope(scope, Some(month))?
            .iter()
            .map(|b| self.summary(b))
            .collect::<FintrackResult<Vec<_>>>()?;

        Ok(BudgetOverview {
            scope,
            month,
            totals: BudgetTotals::from_summaries(&summaries),
            summaries,
        })
    }

    /// Budgets near or over their limit, across every scope the actor sees
    pub fn alerts(&self, actor: UserId, month: Month) -> FintrackResult<Vec<BudgetSummary>> {
        let mut alerts = Vec::new();
        for scope in self.scopes_for(actor)? {
            for budget in self.storage.budgets.get_for_scope(scope, Some(month))? {
                let summary = self.summary(&budget)?;
                if summary.status.needs_attention() {
                    alerts.push(summary);
                }
            }
        }
        alerts.sort_by(|a, b| b.percent_used.total_cmp(&a.percent_used));
        Ok(alerts)
    }

    /// Move part of one budget's unspent limit to another budget
    pub fn transfer(
        &self,
        actor: UserId,
        from: BudgetId,
        to: BudgetId,
        amount: Money,
        note: &str,
    ) -> FintrackResult<BudgetTransfer> {
        let source = self.get(actor, from)?;
        let target = self.get(actor, to)?;
        self.authorize_write(actor, source.scope)?;
        self.authorize_write(actor, target.scope)?;

        let transfer = BudgetTransfer::new(&source, &target, amount, note.trim(), actor);
        let from_spent = self.spent(&source)?;
        let (new_from, new_to) = self
            .storage
            .budgets
            .apply_transfer(transfer.clone(), from_spent)?;

        self.storage.log_create(
            Some(actor),
            EntityType::BudgetTransfer,
            transfer.id.to_string(),
            None,
            &transfer,
        )?;
        self.storage.log_update(
            Some(actor),
            EntityType::Budget,
            source.id.to_string(),
            None,
            &source,
            &new_from,
        )?;
        self.storage.log_update(
            Some(actor),
            EntityType::Budget,
            target.id.to_string(),
            None,
            &target,
            &new_to,
        )?;
        tracing::info!(
            from = %from,
            to = %to,
            amount = amount.cents(),
            "budget transfer applied"
        );

        Ok(transfer)
    }

    pub fn transfers(
        &self,
        actor: UserId,
        scope: BudgetScope,
        month: Option<Month>,
    ) -> FintrackResult<Vec<BudgetTransfer>> {
        self.authorize_read(actor, scope)?;
        self.storage.budgets.transfers_for(scope, month)
    }

    /// Copy limits and thresholds from one month to another
    ///
    /// Categories already budgeted in `to` are left alone.
    pub fn copy_month(
        &self,
        actor: UserId,
        scope: BudgetScope,
        from: Month,
        to: Month,
    ) -> FintrackResult<Vec<Budget>> {
        self.authorize_write(actor, scope)?;
        if from == to {
            return Err(FintrackError::Validation(
                "Source and target months are the same".into(),
            ));
        }

        let mut created = Vec::new();
        for source in self.storage.budgets.get_for_scope(scope, Some(from))? {
            if self
                .storage
                .budgets
                .find_by_key(scope, source.category_id, to)?
                .is_some()
            {
                continue;
            }
            let mut budget = Budget::new(
                scope,
                source.category_id,
                to,
                source.limit,
                source.alert_threshold,
                actor,
            );
            budget.notes = source.notes.clone();
            self.storage.budgets.upsert(budget.clone())?;
            created.push(budget);
        }

        if !created.is_empty() {
            self.storage.budgets.save()?;
            for budget in &created {
                self.storage.log_create(
                    Some(actor),
                    EntityType::Budget,
                    budget.id.to_string(),
                    None,
                    budget,
                )?;
            }
        }

        Ok(created)
    }
}
