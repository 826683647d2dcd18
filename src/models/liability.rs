//! Liability (debt) model
//!
//! Tracks a loan or credit line with its payment history. Each payment is
//! split into interest (one month at the current APR) and principal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{LiabilityId, PaymentId, UserId};
use super::money::Money;
use super::month::Month;

/// Upper bound on simulated payoff schedules (100 years)
pub const MAX_PAYOFF_MONTHS: u32 = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LiabilityKind {
    CreditCard,
    PersonalLoan,
    AutoLoan,
    StudentLoan,
    Mortgage,
    Medical,
    #[default]
    Other,
}

impl fmt::Display for LiabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreditCard => "Credit Card",
            Self::PersonalLoan => "Personal Loan",
            Self::AutoLoan => "Auto Loan",
            Self::StudentLoan => "Student Loan",
            Self::Mortgage => "Mortgage",
            Self::Medical => "Medical",
            Self::Other => "Other",
        };
        f.pad(name)
    }
}

impl FromStr for LiabilityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "credit" | "credit_card" | "card" => Ok(Self::CreditCard),
            "personal" | "personal_loan" => Ok(Self::PersonalLoan),
            "auto" | "auto_loan" | "car" => Ok(Self::AutoLoan),
            "student" | "student_loan" => Ok(Self::StudentLoan),
            "mortgage" => Ok(Self::Mortgage),
            "medical" => Ok(Self::Medical),
            "other" => Ok(Self::Other),
            other => Err(format!("Unknown liability kind: {}", other)),
        }
    }
}

/// One recorded payment, already split into interest and principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiabilityPayment {
    pub id: PaymentId,
    pub date: NaiveDate,
    pub amount: Money,
    pub interest: Money,
    pub principal: Money,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Liability {
    pub id: LiabilityId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub kind: LiabilityKind,
    #[serde(default)]
    pub lender: String,
    pub original_balance: Money,
    pub current_balance: Money,
    /// Annual percentage rate in basis points (1999 = 19.99%)
    pub apr_bps: u32,
    #[serde(default)]
    pub minimum_payment: Money,
    /// Day of month the payment is due (1-28)
    #[serde(default)]
    pub due_day: Option<u8>,
    /// Credit limit, for revolving credit
    #[serde(default)]
    pub credit_limit: Option<Money>,
    #[serde(default)]
    pub opened_on: Option<NaiveDate>,
    #[serde(default)]
    pub payments: Vec<LiabilityPayment>,
    #[serde(default)]
    pub closed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Liability {
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        kind: LiabilityKind,
        balance: Money,
        apr_bps: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: LiabilityId::new(),
            user_id,
            name: name.into().trim().to_string(),
            kind,
            lender: String::new(),
            original_balance: balance,
            current_balance: balance,
            apr_bps,
            minimum_payment: Money::zero(),
            due_day: None,
            credit_limit: None,
            opened_on: None,
            payments: Vec::new(),
            closed: balance.is_zero(),
            created_at: now,
            updated_at: now,
        }
    }

    /// APR as a fraction (0.1999 for 19.99%)
    pub fn apr(&self) -> f64 {
        self.apr_bps as f64 / 10_000.0
    }

    /// Interest accrued on the current balance over one month
    pub fn monthly_interest(&self) -> Money {
        monthly_interest(self.current_balance, self.apr_bps)
    }

    /// Apply a payment: interest first, the rest reduces the balance
    pub fn record_payment(
        &mut self,
        amount: Money,
        date: NaiveDate,
        note: impl Into<String>,
    ) -> Result<LiabilityPayment, LiabilityValidationError> {
        if self.closed {
            return Err(LiabilityValidationError::Closed);
        }
        if !amount.is_positive() {
            return Err(LiabilityValidationError::NonPositivePayment);
        }

        let interest_due = self.monthly_interest();
        let payoff = self.current_balance + interest_due;
        if amount > payoff {
            return Err(LiabilityValidationError::Overpayment {
                amount,
                payoff,
            });
        }

        let interest = amount.min(interest_due);
        let principal = amount - interest;
        let payment = LiabilityPayment {
            id: PaymentId::new(),
            date,
            amount,
            interest,
            principal,
            note: note.into(),
        };

        self.current_balance -= principal;
        if !self.current_balance.is_positive() {
            self.current_balance = Money::zero();
            self.closed = true;
        }
        self.payments.push(payment.clone());
        self.updated_at = Utc::now();
        Ok(payment)
    }

    /// Balance as a percentage of the credit limit (credit cards only)
    pub fn utilization(&self) -> Option<f64> {
        match (self.kind, self.credit_limit) {
            (LiabilityKind::CreditCard, Some(limit)) if limit.is_positive() => {
                Some(self.current_balance.percent_of(limit))
            }
            _ => None,
        }
    }

    pub fn total_paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    pub fn total_interest_paid(&self) -> Money {
        self.payments.iter().map(|p| p.interest).sum()
    }

    /// Share of the original balance already repaid
    pub fn percent_paid_off(&self) -> f64 {
        (self.original_balance - self.current_balance)
            .max(Money::zero())
            .percent_of(self.original_balance)
    }

    /// Simulate paying `monthly_payment` every month starting next month
    pub fn payoff_plan(
        &self,
        monthly_payment: Money,
        start: Month,
    ) -> Result<PayoffPlan, LiabilityValidationError> {
        simulate_payoff(self.current_balance, self.apr_bps, monthly_payment, start)
    }

    pub fn validate(&self) -> Result<(), LiabilityValidationError> {
        if self.name.trim().is_empty() {
            return Err(LiabilityValidationError::EmptyName);
        }
        if self.original_balance.is_negative() || self.current_balance.is_negative() {
            return Err(LiabilityValidationError::NegativeBalance);
        }
        if self.minimum_payment.is_negative() {
            return Err(LiabilityValidationError::NegativeMinimum);
        }
        if let Some(day) = self.due_day {
            if !(1..=28).contains(&day) {
                return Err(LiabilityValidationError::InvalidDueDay(day));
            }
        }
        if let Some(limit) = self.credit_limit {
            if !limit.is_positive() {
                return Err(LiabilityValidationError::InvalidCreditLimit);
            }
        }
        Ok(())
    }
}

impl fmt::Display for Liability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {} @ {:.2}%",
            self.name,
            self.kind,
            self.current_balance,
            self.apr() * 100.0
        )
    }
}

/// One month of interest on `balance` at `apr_bps`
pub fn monthly_interest(balance: Money, apr_bps: u32) -> Money {
    balance.mul_rate(apr_bps as f64 / 10_000.0 / 12.0)
}

/// One simulated month of a payoff schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffStep {
    pub month: Month,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffPlan {
    pub months: u32,
    pub total_interest: Money,
    pub total_paid: Money,
    pub payoff_month: Month,
    pub schedule: Vec<PayoffStep>,
}

/// Amortise `balance` with a fixed monthly payment
///
/// The payment must exceed the first month's interest, otherwise the debt
/// never shrinks.
pub fn simulate_payoff(
    balance: Money,
    apr_bps: u32,
    monthly_payment: Money,
    start: Month,
) -> Result<PayoffPlan, LiabilityValidationError> {
    let first_interest = monthly_interest(balance, apr_bps);
    if !monthly_payment.is_positive() || (balance.is_positive() && monthly_payment <= first_interest)
    {
        return Err(LiabilityValidationError::PaymentTooLow {
            payment: monthly_payment,
            interest: first_interest,
        });
    }

    let mut remaining = balance;
    let mut month = start;
    let mut schedule = Vec::new();
    let mut total_interest = Money::zero();
    let mut total_paid = Money::zero();

    while remaining.is_positive() {
        if schedule.len() as u32 >= MAX_PAYOFF_MONTHS {
            return Err(LiabilityValidationError::PayoffTooLong);
        }
        month = month.next();

        let interest = monthly_interest(remaining, apr_bps);
        let payment = monthly_payment.min(remaining + interest);
        let principal = payment - interest;
        remaining -= principal;

        total_interest += interest;
        total_paid += payment;
        schedule.push(PayoffStep {
            month,
            payment,
            interest,
            principal,
            balance: remaining,
        });
    }

    Ok(PayoffPlan {
        months: schedule.len() as u32,
        total_interest,
        total_paid,
        payoff_month: month,
        schedule,
    })
}

/// Validation errors for liabilities
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiabilityValidationError {
    EmptyName,
    NegativeBalance,
    NegativeMinimum,
    InvalidDueDay(u8),
    InvalidCreditLimit,
    NonPositivePayment,
    Overpayment { amount: Money, payoff: Money },
    PaymentTooLow { payment: Money, interest: Money },
    PayoffTooLong,
    Closed,
}

impl fmt::Display for LiabilityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Liability name cannot be empty"),
            Self::NegativeBalance => write!(f, "Balance cannot be negative"),
            Self::NegativeMinimum => write!(f, "Minimum payment cannot be negative"),
            Self::InvalidDueDay(day) => write!(f, "Due day must be 1-28 (got {})", day),
            Self::InvalidCreditLimit => write!(f, "Credit limit must be positive"),
            Self::NonPositivePayment => write!(f, "Payment must be positive"),
            Self::Overpayment { amount, payoff } => write!(
                f,
                "Payment {} exceeds the payoff amount {}",
                amount, payoff
            ),
            Self::PaymentTooLow { payment, interest } => write!(
                f,
                "Payment {} does not cover the monthly interest {}",
                payment, interest
            ),
            Self::PayoffTooLong => write!(
                f,
                "Debt would take more than {} months to repay",
                MAX_PAYOFF_MONTHS
            ),
            Self::Closed => write!(f, "Liability is already paid off"),
        }
    }
}

impl std::error::Error for LiabilityValidationError {}
