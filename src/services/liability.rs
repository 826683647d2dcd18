//! Liability service
//!
//! Debts with their payment history, amortisation plans and the two classic
//! payoff orderings.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::audit::EntityType;
use crate::error::{FintrackError, FintrackResult};
use crate::models::{
    Liability, LiabilityId, LiabilityKind, LiabilityPayment, Money, Month, PayoffPlan, UserId,
};
use crate::storage::Storage;

/// Service for liabilities
pub struct LiabilityService<'a> {
    storage: &'a Storage,
}

#[derive(Debug, Clone)]
pub struct CreateLiabilityInput {
    pub name: String,
    pub kind: LiabilityKind,
    pub balance: Money,
    /// Annual rate in basis points (1999 = 19.99%)
    pub apr_bps: u32,
    pub minimum_payment: Money,
    pub lender: String,
    pub due_day: Option<u8>,
    pub credit_limit: Option<Money>,
    pub opened_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateLiabilityInput {
    pub name: Option<String>,
    pub lender: Option<String>,
    pub apr_bps: Option<u32>,
    pub minimum_payment: Option<Money>,
    pub due_day: Option<Option<u8>>,
    pub credit_limit: Option<Option<Money>>,
    /// Correct the balance by hand (e.g. after new card spending)
    pub current_balance: Option<Money>,
}

/// Totals across a user's open debts
#[derive(Debug, Clone, Default, Serialize)]
pub struct DebtSummary {
    pub count: usize,
    pub total_balance: Money,
    pub total_minimum_payment: Money,
    /// Balance-weighted APR, as a percentage
    pub weighted_apr: f64,
    /// Credit card balances over credit card limits, as a percentage
    pub credit_utilization: Option<f64>,
    pub total_interest_paid: Money,
}

/// Order in which to attack debts with extra payments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayoffStrategy {
    /// Highest APR first; pays the least interest
    #[default]
    Avalanche,
    /// Smallest balance first; clears accounts soonest
    Snowball,
}

impl fmt::Display for PayoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Avalanche => f.pad("avalanche"),
            Self::Snowball => f.pad("snowball"),
        }
    }
}

impl FromStr for PayoffStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "avalanche" | "apr" => Ok(Self::Avalanche),
            "snowball" | "balance" => Ok(Self::Snowball),
            other => Err(format!(
                "Unknown strategy '{}' (expected avalanche or snowball)",
                other
            )),
        }
    }
}

impl<'a> LiabilityService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(
        &self,
        user_id: UserId,
        input: CreateLiabilityInput,
    ) -> FintrackResult<Liability> {
        let mut liability = Liability::new(
            user_id,
            input.name,
            input.kind,
            input.balance,
            input.apr_bps,
        );
        liability.minimum_payment = input.minimum_payment;
        liability.lender = input.lender.trim().to_string();
        liability.due_day = input.due_day;
        liability.credit_limit = input.credit_limit;
        liability.opened_on = input.opened_on;

        liability
            .validate()
            .map_err(|e| FintrackError::Validation(e.to_string()))?;

        self.storage.liabilities.upsert(liability.clone())?;
        self.storage.liabilities.save()?;

        self.storage.log_create(
            Some(user_id),
            EntityType::Liability,
            liability.id.to_string(),
            Some(liability.name.clone()),
            &liability,
        )?;

        Ok(liability)
    }

    pub fn get(&self, user_id: UserId, id: LiabilityId) -> FintrackResult<Liability> {
        match self.storage.liabilities.get(id)? {
            Some(liability) if liability.user_id == user_id => Ok(liability),
            _ => Err(FintrackError::liability_not_found(id.to_string())),
        }
    }

    /// Find one of the user's liabilities by name or ID
    pub fn find(&self, user_id: UserId, identifier: &str) -> FintrackResult<Liability> {
        if let Ok(id) = LiabilityId::parse(identifier.trim()) {
            return self.get(user_id, id);
        }
        let all = self.storage.liabilities.get_by_owner(user_id)?;
        all.iter()
            .find(|l| l.name.eq_ignore_ascii_case(identifier.trim()))
            .or_else(|| all.iter().find(|l| l.id.matches_short(identifier)))
            .cloned()
            .ok_or_else(|| FintrackError::liability_not_found(identifier))
    }

    /// The user's liabilities, largest balance first
    pub fn list(&self, user_id: UserId, include_closed: bool) -> FintrackResult<Vec<Liability>> {
        let mut liabilities: Vec<Liability> = self
            .storage
            .liabilities
            .get_by_owner(user_id)?
            .into_iter()
            .filter(|l| include_closed || !l.closed)
            .collect();
        liabilities.sort_by(|a, b| {
            a.closed
                .cmp(&b.closed)
                .then_with(|| b.current_balance.cmp(&a.current_balance))
        });
        Ok(liabilities)
    }

    fn save_update(
        &self,
        user_id: UserId,
        before: &Liability,
        liability: &Liability,
    ) -> FintrackResult<()> {
        self.storage.liabilities.upsert(liability.clone())?;
        self.storage.liabilities.save()?;
        self.storage.log_update(
            Some(user_id),
            EntityType::Liability,
            liability.id.to_string(),
            Some(liability.name.clone()),
            before,
            liability,
        )
    }

    pub fn update(
        &self,
        user_id: UserId,
        id: LiabilityId,
        input: UpdateLiabilityInput,
    ) -> FintrackResult<Liability> {
        let mut liability = self.get(user_id, id)?;
        let before = liability.clone();

        if let Some(name) = input.name {
            liability.name = name.trim().to_string();
        }
        if let Some(lender) = input.lender {
            liability.lender = lender.trim().to_string();
        }
        if let Some(apr) = input.apr_bps {
            liability.apr_bps = apr;
        }
        if let Some(minimum) = input.minimum_payment {
            liability.minimum_payment = minimum;
        }
        if let Some(due_day) = input.due_day {
            liability.due_day = due_day;
        }
        if let Some(limit) = input.credit_limit {
            liability.credit_limit = limit;
        }
        if let Some(balance) = input.current_balance {
            liability.current_balance = balance;
            liability.closed = balance.is_zero();
        }

        liability
            .validate()
            .map_err(|e| FintrackError::Validation(e.to_string()))?;
        liability.updated_at = chrono::Utc::now();

        self.save_update(user_id, &before, &liability)?;
        Ok(liability)
    }

    /// Apply a payment; interest is covered before principal
    pub fn record_payment(
        &self,
        user_id: UserId,
        id: LiabilityId,
        amount: Money,
        date: NaiveDate,
        note: &str,
    ) -> FintrackResult<(Liability, LiabilityPayment)> {
        let mut liability = self.get(user_id, id)?;
        let before = liability.clone();

        let payment = liability
            .record_payment(amount, date, note.trim())
            .map_err(|e| FintrackError::Validation(e.to_string()))?;
        self.save_update(user_id, &before, &liability)?;

        if liability.closed {
            tracing::info!(liability = %liability.id, "liability paid off");
        }
        Ok((liability, payment))
    }

    pub fn delete(&self, user_id: UserId, id: LiabilityId) -> FintrackResult<Liability> {
        let liability = self.get(user_id, id)?;
        self.storage.liabilities.delete(id)?;
        self.storage.liabilities.save()?;

        self.storage.log_delete(
            Some(user_id),
            EntityType::Liability,
            liability.id.to_string(),
            Some(liability.name.clone()),
            &liability,
        )?;
        Ok(liability)
    }

    /// Amortisation schedule at a fixed monthly payment
    ///
    /// Without an explicit payment the liability's minimum is used.
    pub fn payoff_plan(
        &self,
        user_id: UserId,
        id: LiabilityId,
        payment: Option<Money>,
        start: Month,
    ) -> FintrackResult<PayoffPlan> {
        let liability = self.get(user_id, id)?;
        let payment = payment.unwrap_or(liability.minimum_payment);
        liability
            .payoff_plan(payment, start)
            .map_err(|e| FintrackError::Validation(e.to_string()))
    }

    pub fn summary(&self, user_id: UserId) -> FintrackResult<DebtSummary> {
        let all = self.storage.liabilities.get_by_owner(user_id)?;
        let open: Vec<&Liability> = all.iter().filter(|l| !l.closed).collect();

        let total_balance: Money = open.iter().map(|l| l.current_balance).sum();
        let weighted_apr = if total_balance.is_positive() {
            open.iter()
                .map(|l| l.current_balance.cents() as f64 * l.apr_bps as f64)
                .sum::<f64>()
                / total_balance.cents() as f64
                / 100.0
        } else {
            0.0
        };

        let cards: Vec<(Money, Money)> = open
            .iter()
            .filter(|l| l.kind == LiabilityKind::CreditCard)
            .filter_map(|l| l.credit_limit.map(|limit| (l.current_balance, limit)))
            .collect();
        let credit_utilization = if cards.is_empty() {
            None
        } else {
            let balance: Money = cards.iter().map(|(b, _)| *b).sum();
            let limit: Money = cards.iter().map(|(_, l)| *l).sum();
            Some(balance.percent_of(limit))
        };

        Ok(DebtSummary {
            count: open.len(),
            total_balance,
            total_minimum_payment: open.iter().map(|l| l.minimum_payment).sum(),
            weighted_apr,
            credit_utilization,
            total_interest_paid: all.iter().map(|l| l.total_interest_paid()).sum(),
        })
    }

    /// Open liabilities in the order a strategy would pay them down
    pub fn payoff_order(
        &self,
        user_id: UserId,
        strategy: PayoffStrategy,
    ) -> FintrackResult<Vec<Liability>> {
        let mut open = self.list(user_id, false)?;
        match strategy {
            PayoffStrategy::Avalanche => open.sort_by(|a, b| {
                b.apr_bps
                    .cmp(&a.apr_bps)
                    .then_with(|| a.current_balance.cmp(&b.current_balance))
            }),
            PayoffStrategy::Snowball => open.sort_by(|a, b| {
                a.current_balance
                    .cmp(&b.current_balance)
                    .then_with(|| b.apr_bps.cmp(&a.apr_bps))
            }),
        }
        Ok(open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{create_test_storage, register};

    fn input(name: &str, kind: LiabilityKind, balance: i64, apr_bps: u32) -> CreateLiabilityInput {
        CreateLiabilityInput {
            name: name.into(),
            kind,
            balance: Money::from_cents(balance),
            apr_bps,
            minimum_payment: Money::from_cents(5_000),
            lender: String::new(),
            due_day: None,
            credit_limit: None,
            opened_on: None,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_create_validates() {
        let (_temp_dir, storage) = create_test_storage();
        let service = LiabilityService::new(&storage);
        let alice = register(&storage, "alice");

        let bad_day = CreateLiabilityInput {
            due_day: Some(31),
            ..input("Card", LiabilityKind::CreditCard, 10_000, 1999)
        };
        assert!(service.create(alice.id, bad_day).unwrap_err().is_validation());

        let card = service
            .create(alice.id, input("Card", LiabilityKind::CreditCard, 10_000, 1999))
            .unwrap();
        assert_eq!(service.find(alice.id, "card").unwrap().id, card.id);
    }

    #[test]
    fn test_record_payment_until_closed() {
        let (_temp_dir, storage) = create_test_storage();
        let service = LiabilityService::new(&storage);
        let alice = register(&storage, "alice");
        // zero interest keeps the arithmetic exact
        let loan = service
            .create(alice.id, input("Loan", LiabilityKind::PersonalLoan, 20_000, 0))
            .unwrap();

        let (loan, payment) = service
            .record_payment(alice.id, loan.id, Money::from_cents(15_000), d(2025, 1, 1), "")
            .unwrap();
        assert_eq!(payment.principal.cents(), 15_000);
        assert_eq!(loan.current_balance.cents(), 5_000);

        let overpay =
            service.record_payment(alice.id, loan.id, Money::from_cents(6_000), d(2025, 2, 1), "");
        assert!(overpay.unwrap_err().is_validation());

        let (loan, _) = service
            .record_payment(alice.id, loan.id, Money::from_cents(5_000), d(2025, 2, 1), "")
            .unwrap();
        assert!(loan.closed);
        assert!(service.list(alice.id, false).unwrap().is_empty());
        assert_eq!(service.list(alice.id, true).unwrap().len(), 1);
    }

    #[test]
    fn test_summary() {
        let (_temp_dir, storage) = create_test_storage();
        let service = LiabilityService::new(&storage);
        let alice = register(&storage, "alice");

        service
            .create(
                alice.id,
                CreateLiabilityInput {
                    credit_limit: Some(Money::from_cents(400_000)),
                    ..input("Card", LiabilityKind::CreditCard, 100_000, 2000)
                },
            )
            .unwrap();
        service
            .create(alice.id, input("Car", LiabilityKind::AutoLoan, 300_000, 400))
            .unwrap();

        let summary = service.summary(alice.id).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_balance.cents(), 400_000);
        assert_eq!(summary.total_minimum_payment.cents(), 10_000);
        // (100k * 20% + 300k * 4%) / 400k = 8%
        assert!((summary.weighted_apr - 8.0).abs() < 1e-9);
        assert!((summary.credit_utilization.unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_payoff_order_and_plan() {
        let (_temp_dir, storage) = create_test_storage();
        let service = LiabilityService::new(&storage);
        let alice = register(&storage, "alice");

        let card = service
            .create(alice.id, input("Card", LiabilityKind::CreditCard, 200_000, 2400))
            .unwrap();
        let medical = service
            .create(alice.id, input("Medical", LiabilityKind::Medical, 30_000, 0))
            .unwrap();

        let avalanche = service
            .payoff_order(alice.id, PayoffStrategy::Avalanche)
            .unwrap();
        assert_eq!(avalanche[0].id, card.id);
        let snowball = service.payoff_order(alice.id, PayoffStrategy::Snowball).unwrap();
        assert_eq!(snowball[0].id, medical.id);

        let plan = service
            .payoff_plan(alice.id, medical.id, Some(Money::from_cents(10_000)), Month::new(2025, 1).unwrap())
            .unwrap();
        assert_eq!(plan.months, 3);
        assert_eq!(plan.payoff_month, Month::new(2025, 4).unwrap());

        // 2% monthly interest on 2000 is 40; a 30 payment never pays it off
        let too_low = service.payoff_plan(
            alice.id,
            card.id,
            Some(Money::from_cents(3_000)),
            Month::new(2025, 1).unwrap(),
        );
        assert!(too_low.unwrap_err().is_validation());

        assert_eq!("snowball".parse::<PayoffStrategy>(), Ok(PayoffStrategy::Snowball));
    }
}
