//! Savings goal service

use chrono::NaiveDate;
use serde::Serialize;

use crate::audit::EntityType;
use crate::error::{FintrackError, FintrackResult};
use crate::models::{Goal, GoalId, GoalKind, GoalStatus, Money, Month, UserId};
use crate::storage::Storage;

/// Service for savings goals
pub struct GoalService<'a> {
    storage: &'a Storage,
}

#[derive(Debug, Clone)]
pub struct CreateGoalInput {
    pub name: String,
    pub kind: GoalKind,
    pub target_amount: Money,
    pub target_date: Option<NaiveDate>,
    /// Recorded as a first contribution
    pub initial_amount: Option<Money>,
}

/// Partial update; `target_date: Some(None)` clears the date
#[derive(Debug, Clone, Default)]
pub struct UpdateGoalInput {
    pub name: Option<String>,
    pub kind: Option<GoalKind>,
    pub target_amount: Option<Money>,
    pub target_date: Option<Option<NaiveDate>>,
}

/// Where a goal stands on a given day
#[derive(Debug, Clone, Serialize)]
pub struct GoalProgress {
    pub goal_id: GoalId,
    pub name: String,
    pub status: GoalStatus,
    pub saved: Money,
    pub target: Money,
    pub remaining: Money,
    pub percent: f64,
    pub months_remaining: Option<u32>,
    pub required_monthly: Option<Money>,
    pub average_monthly: Money,
    pub projected_completion: Option<Month>,
    pub on_track: bool,
}

impl<'a> GoalService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(&self, user_id: UserId, input: CreateGoalInput) -> FintrackResult<Goal> {
        let mut goal = Goal::new(
            user_id,
            input.name,
            input.kind,
            input.target_amount,
            input.target_date,
        );
        goal.validate()
            .map_err(|e| FintrackError::Validation(e.to_string()))?;

        if let Some(initial) = input.initial_amount.filter(|a| !a.is_zero()) {
            let today = chrono::Local::now().date_naive();
            goal.contribute(initial, today, "Initial balance")
                .map_err(|e| FintrackError::Validation(e.to_string()))?;
        }

        self.storage.goals.upsert(goal.clone())?;
        self.storage.goals.save()?;

        self.storage.log_create(
            Some(user_id),
            EntityType::Goal,
            goal.id.to_string(),
            Some(goal.name.clone()),
            &goal,
        )?;

        Ok(goal)
    }

    pub fn get(&self, user_id: UserId, id: GoalId) -> FintrackResult<Goal> {
        match self.storage.goals.get(id)? {
            Some(goal) if goal.user_id == user_id => Ok(goal),
            _ => Err(FintrackError::goal_not_found(id.to_string())),
        }
    }

    /// Find one of the user's goals by name or ID
    pub fn find(&self, user_id: UserId, identifier: &str) -> FintrackResult<Goal> {
        if let Ok(id) = GoalId::parse(identifier.trim()) {
            return self.get(user_id, id);
        }
        let goals = self.storage.goals.get_by_owner(user_id)?;
        goals
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(identifier.trim()))
            .or_else(|| goals.iter().find(|g| g.id.matches_short(identifier)))
            .cloned()
            .ok_or_else(|| FintrackError::goal_not_found(identifier))
    }

    /// The user's goals, active ones first
    pub fn list(&self, user_id: UserId, include_archived: bool) -> FintrackResult<Vec<Goal>> {
        let mut goals: Vec<Goal> = self
            .storage
            .goals
            .get_by_owner(user_id)?
            .into_iter()
            .filter(|g| include_archived || !g.is_archived())
            .collect();
        goals.sort_by(|a, b| {
            status_rank(a.status)
                .cmp(&status_rank(b.status))
                .then_with(|| a.target_date.cmp(&b.target_date))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(goals)
    }

    fn save_update(&self, user_id: UserId, before: &Goal, goal: &Goal) -> FintrackResult<()> {
        self.storage.goals.upsert(goal.clone())?;
        self.storage.goals.save()?;
        self.storage.log_update(
            Some(user_id),
            EntityType::Goal,
            goal.id.to_string(),
            Some(goal.name.clone()),
            before,
            goal,
        )
    }

    /// Deposit into (positive) or withdraw from (negative) a goal
    pub fn contribute(
        &self,
        user_id: UserId,
        id: GoalId,
        amount: Money,
        date: NaiveDate,
        note: &str,
    ) -> FintrackResult<Goal> {
        let mut goal = self.get(user_id, id)?;
        let before = goal.clone();

        goal.contribute(amount, date, note.trim())
            .map_err(|e| FintrackError::Validation(e.to_string()))?;
        self.save_update(user_id, &before, &goal)?;

        if goal.is_completed() && !before.is_completed() {
            tracing::info!(goal = %goal.id, "goal reached");
        }
        Ok(goal)
    }

    pub fn update(
        &self,
        user_id: UserId,
        id: GoalId,
        input: UpdateGoalInput,
    ) -> FintrackResult<Goal> {
        let mut goal = self.get(user_id, id)?;
        let before = goal.clone();

        if let Some(name) = input.name {
            goal.name = name.trim().to_string();
        }
        if let Some(kind) = input.kind {
            goal.kind = kind;
        }
        if let Some(target) = input.target_amount {
            goal.target_amount = target;
        }
        if let Some(date) = input.target_date {
            goal.target_date = date;
        }

        goal.validate()
            .map_err(|e| FintrackError::Validation(e.to_string()))?;
        goal.refresh_status();
        goal.updated_at = chrono::Utc::now();

        self.save_update(user_id, &before, &goal)?;
        Ok(goal)
    }

    pub fn archive(&self, user_id: UserId, id: GoalId) -> FintrackResult<Goal> {
        let mut goal = self.get(user_id, id)?;
        if goal.is_archived() {
            return Ok(goal);
        }
        let before = goal.clone();
        goal.archive();
        self.save_update(user_id, &before, &goal)?;
        Ok(goal)
    }

    pub fn delete(&self, user_id: UserId, id: GoalId) -> FintrackResult<Goal> {
        let goal = self.get(user_id, id)?;
        self.storage.goals.delete(id)?;
        self.storage.goals.save()?;

        self.storage.log_delete(
            Some(user_id),
            EntityType::Goal,
            goal.id.to_string(),
            Some(goal.name.clone()),
            &goal,
        )?;
        Ok(goal)
    }

    pub fn progress(&self, goal: &Goal, today: NaiveDate) -> GoalProgress {
        GoalProgress {
            goal_id: goal.id,
            name: goal.name.clone(),
            status: goal.status,
            saved: goal.saved_amount,
            target: goal.target_amount,
            remaining: goal.remaining(),
            percent: goal.progress_percent(),
            months_remaining: goal.months_remaining(today),
            required_monthly: goal.required_monthly(today),
            average_monthly: goal.average_monthly_contribution(today),
            projected_completion: goal.projected_completion(today),
            on_track: goal.is_on_track(today),
        }
    }
}

fn status_rank(status: GoalStatus) -> u8 {
    match status {
        GoalStatus::Active => 0,
        GoalStatus::Completed => 1,
        GoalStatus::Archived => 2,
    }
}
