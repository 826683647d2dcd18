//! Savings goal model
//!
//! A goal tracks money set aside toward a target amount, optionally by a
//! target date. Contributions are kept as history so the saving pace can be
//! projected forward.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{GoalId, UserId};
use super::money::Money;
use super::month::Month;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    EmergencyFund,
    Retirement,
    Purchase,
    Travel,
    Education,
    DebtPayoff,
    #[default]
    Other,
}

impl GoalKind {
    pub fn all() -> &'static [Self] {
        &[
            Self::EmergencyFund,
            Self::Retirement,
            Self::Purchase,
            Self::Travel,
            Self::Education,
            Self::DebtPayoff,
            Self::Other,
        ]
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EmergencyFund => "Emergency Fund",
            Self::Retirement => "Retirement",
            Self::Purchase => "Purchase",
            Self::Travel => "Travel",
            Self::Education => "Education",
            Self::DebtPayoff => "Debt Payoff",
            Self::Other => "Other",
        };
        f.pad(name)
    }
}

impl FromStr for GoalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "emergency" | "emergency_fund" => Ok(Self::EmergencyFund),
            "retirement" => Ok(Self::Retirement),
            "purchase" => Ok(Self::Purchase),
            "travel" => Ok(Self::Travel),
            "education" => Ok(Self::Education),
            "debt" | "debt_payoff" => Ok(Self::DebtPayoff),
            "other" => Ok(Self::Other),
            other => Err(format!("Unknown goal kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.pad("Active"),
            Self::Completed => f.pad("Completed"),
            Self::Archived => f.pad("Archived"),
        }
    }
}

/// A deposit (positive) or withdrawal (negative)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub kind: GoalKind,
    pub target_amount: Money,
    #[serde(default)]
    pub saved_amount: Money,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        kind: GoalKind,
        target_amount: Money,
        target_date: Option<NaiveDate>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: GoalId::new(),
            user_id,
            name: name.into().trim().to_string(),
            kind,
            target_amount,
            saved_amount: Money::zero(),
            target_date,
            status: GoalStatus::Active,
            contributions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.status == GoalStatus::Archived
    }

    pub fn is_completed(&self) -> bool {
        self.status == GoalStatus::Completed
    }

    /// Add to (or, with a negative amount, withdraw from) the saved balance
    pub fn contribute(
        &mut self,
        amount: Money,
        date: NaiveDate,
        note: impl Into<String>,
    ) -> Result<(), GoalValidationError> {
        if self.is_archived() {
            return Err(GoalValidationError::Archived);
        }
        if amount.is_zero() {
            return Err(GoalValidationError::ZeroContribution);
        }
        if amount.is_negative() && amount.abs() > self.saved_amount {
            return Err(GoalValidationError::WithdrawalExceedsSaved {
                requested: amount.abs(),
                saved: self.saved_amount,
            });
        }

        self.saved_amount += amount;
        self.contributions.push(Contribution {
            date,
            amount,
            note: note.into(),
        });
        self.refresh_status();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Re-derive Active/Completed from the balance; archived goals stay archived
    pub fn refresh_status(&mut self) {
        if self.is_archived() {
            return;
        }
        self.status = if self.saved_amount >= self.target_amount {
            GoalStatus::Completed
        } else {
            GoalStatus::Active
        };
    }

    pub fn archive(&mut self) {
        self.status = GoalStatus::Archived;
        self.updated_at = Utc::now();
    }

    /// Saved as a percentage of the target, capped at 100
    pub fn progress_percent(&self) -> f64 {
        if self.target_amount.is_zero() {
            return 100.0;
        }
        self.saved_amount.percent_of(self.target_amount).min(100.0)
    }

    /// Amount still to save, never negative
    pub fn remaining(&self) -> Money {
        (self.target_amount - self.saved_amount).max(Money::zero())
    }

    /// Calendar months left including the current and target months,
    /// zero once the target date has passed
    pub fn months_remaining(&self, today: NaiveDate) -> Option<u32> {
        let target = self.target_date?;
        if target < today {
            return Some(0);
        }
        let months = Month::from_date(today).months_until(Month::from_date(target));
        Some(u32::try_from(months.saturating_add(1)).unwrap_or(0))
    }

    /// Monthly saving needed to hit the target on time
    ///
    /// The whole remaining amount is due when the target date has passed.
    pub fn required_monthly(&self, today: NaiveDate) -> Option<Money> {
        let months = self.months_remaining(today)?;
        let remaining = self.remaining();
        if months == 0 {
            return Some(remaining);
        }
        Some(Money::from_cents(
            (remaining.cents() as f64 / months as f64).ceil() as i64,
        ))
    }

    /// Net contributions per month since the first contribution
    pub fn average_monthly_contribution(&self, today: NaiveDate) -> Money {
        let first = match self.contributions.iter().map(|c| c.date).min() {
            Some(date) => date,
            None => return Money::zero(),
        };
        let months = Month::from_date(first).months_until(Month::from_date(today)) + 1;
        let net: Money = self.contributions.iter().map(|c| c.amount).sum();
        Money::from_cents((net.cents() as f64 / months.max(1) as f64).round() as i64)
    }

    /// Month the goal will be reached at the current saving pace
    pub fn projected_completion(&self, today: NaiveDate) -> Option<Month> {
        let current = Month::from_date(today);
        if self.remaining().is_zero() {
            return Some(current);
        }
        let pace = self.average_monthly_contribution(today);
        if !pace.is_positive() {
            return None;
        }
        // Ceiling division; `remaining` and `pace` are both positive here
        let months = (self.remaining().cents() - 1) / pace.cents() + 1;
        current.checked_plus(u32::try_from(months).ok()?)
    }

    /// Whether the current pace reaches the target by the target date
    ///
    /// Goals without a date are on track while money keeps coming in.
    pub fn is_on_track(&self, today: NaiveDate) -> bool {
        if self.remaining().is_zero() {
            return true;
        }
        match (self.projected_completion(today), self.target_date) {
            (Some(projected), Some(target)) => projected <= Month::from_date(target),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn validate(&self) -> Result<(), GoalValidationError> {
        if self.name.trim().is_empty() {
            return Err(GoalValidationError::EmptyName);
        }
        if !self.target_amount.is_positive() {
            return Err(GoalValidationError::NonPositiveTarget);
        }
        if self.saved_amount.is_negative() {
            return Err(GoalValidationError::NegativeSaved);
        }
        Ok(())
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} of {})",
            self.name, self.saved_amount, self.target_amount
        )
    }
}

/// Validation errors for goals
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalValidationError {
    EmptyName,
    NonPositiveTarget,
    NegativeSaved,
    ZeroContribution,
    WithdrawalExceedsSaved { requested: Money, saved: Money },
    Archived,
}

impl fmt::Display for GoalValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Goal name cannot be empty"),
            Self::NonPositiveTarget => write!(f, "Goal target must be positive"),
            Self::NegativeSaved => write!(f, "Saved amount cannot be negative"),
            Self::ZeroContribution => write!(f, "Contribution cannot be zero"),
            Self::WithdrawalExceedsSaved { requested, saved } => write!(
                f,
                "Cannot withdraw {} from a goal holding {}",
                requested, saved
            ),
            Self::Archived => write!(f, "Goal is archived"),
        }
    }
}

impl std::error::Error for GoalValidationError {}
