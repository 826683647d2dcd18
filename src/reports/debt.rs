//! Debt Report
//!
//! Open liabilities in payoff order, each with the payoff it reaches at the
//! minimum payment, plus totals.

use std::io::Write;

use crate::error::FintrackResult;
use crate::export::escape_csv;
use crate::models::{LiabilityId, LiabilityKind, Money, Month, UserId};
use crate::services::{DebtSummary, LiabilityService, PayoffStrategy};
use crate::storage::Storage;

use super::write_error;

#[derive(Debug, Clone)]
pub struct DebtReportRow {
    pub liability_id: LiabilityId,
    pub name: String,
    pub kind: LiabilityKind,
    pub balance: Money,
    /// Percent
    pub apr: f64,
    pub minimum_payment: Money,
    /// `None` when the minimum never clears the balance
    pub months_to_payoff: Option<u32>,
    pub payoff_month: Option<Month>,
    pub interest_to_payoff: Option<Money>,
}

#[derive(Debug, Clone)]
pub struct DebtReport {
    pub strategy: PayoffStrategy,
    /// In the order the strategy pays them
    pub rows: Vec<DebtReportRow>,
    pub summary: DebtSummary,
}

impl DebtReport {
    pub fn generate(
        storage: &Storage,
        user_id: UserId,
        strategy: PayoffStrategy,
        start: Month,
    ) -> FintrackResult<Self> {
        let service = LiabilityService::new(storage);

        let rows = service
            .payoff_order(user_id, strategy)?
            .into_iter()
            .map(|l| {
                let plan = l.payoff_plan(l.minimum_payment, start).ok();
                DebtReportRow {
                    liability_id: l.id,
                    kind: l.kind,
                    balance: l.current_balance,
                    apr: l.apr() * 100.0,
                    minimum_payment: l.minimum_payment,
                    months_to_payoff: plan.as_ref().map(|p| p.months),
                    payoff_month: plan.as_ref().map(|p| p.payoff_month),
                    interest_to_payoff: plan.as_ref().map(|p| p.total_interest),
                    name: l.name,
                }
            })
            .collect();

        Ok(Self {
            strategy,
            rows,
            summary: service.summary(user_id)?,
        })
    }

    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Debt Report ({} order)\n", self.strategy));
        output.push_str(&"=".repeat(84));
        output.push('\n');

        if self.rows.is_empty() {
            output.push_str("No open debts.\n");
            return output;
        }

        output.push_str(&format!(
            "{:<22} {:<14} {:>12} {:>7} {:>10} {:>8} {:>7}\n",
            "Name", "Kind", "Balance", "APR", "Minimum", "Months", "Paid by"
        ));
        output.push_str(&"-".repeat(84));
        output.push('\n');

        for row in &self.rows {
            let months = row
                .months_to_payoff
                .map(|m| m.to_string())
                .unwrap_or_else(|| "never".to_string());
            let paid_by = row
                .payoff_month
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "{:<22} {:<14} {:>12} {:>6.2}% {:>10} {:>8} {:>7}\n",
                row.name, row.kind, row.balance, row.apr, row.minimum_payment, months, paid_by
            ));
        }

        output.push_str(&"-".repeat(84));
        output.push('\n');
        output.push_str(&format!(
            "Total balance: {}   Minimum payments: {}/month   Weighted APR: {:.2}%\n",
            self.summary.total_balance, self.summary.total_minimum_payment, self.summary.weighted_apr
        ));
        if let Some(utilization) = self.summary.credit_utilization {
            output.push_str(&format!("Credit utilization: {:.1}%\n", utilization));
        }
        output.push_str(&format!(
            "Interest paid so far: {}\n",
            self.summary.total_interest_paid
        ));

        output
    }

    pub fn export_csv<W: Write>(&self, writer: &mut W) -> FintrackResult<()> {
        writeln!(
            writer,
            "Order,Name,Kind,Balance,APR,Minimum Payment,Months To Payoff,Payoff Month,Interest To Payoff"
        )
        .map_err(write_error)?;

        for (index, row) in self.rows.iter().enumerate() {
            writeln!(
                writer,
                "{},{},{},{:.2},{:.2},{:.2},{},{},{}",
                index + 1,
                escape_csv(&row.name),
                row.kind,
                row.balance.as_f64(),
                row.apr,
                row.minimum_payment.as_f64(),
                row.months_to_payoff.map(|m| m.to_string()).unwrap_or_default(),
                row.payoff_month.map(|m| m.to_string()).unwrap_or_default(),
                row.interest_to_payoff
                    .map(|i| format!("{:.2}", i.as_f64()))
                    .unwrap_or_default()
            )
            .map_err(write_error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Liability;
    use crate::services::testing::{create_test_storage, register};

    fn liability(user_id: UserId, name: &str, balance: i64, apr_bps: u32, minimum: i64) -> Liability {
        let mut l = Liability::new(user_id, name, LiabilityKind::PersonalLoan, Money::from_cents(balance), apr_bps);
        l.minimum_payment = Money::from_cents(minimum);
        l
    }

    #[test]
    fn test_debt_report() {
        let (_temp_dir, storage) = create_test_storage();
        let alice = register(&storage, "alice");
        storage
            .liabilities
            .upsert(liability(alice.id, "Family loan", 120_000, 0, 10_000))
            .unwrap();
        // 120% APR accrues 20.00 a month, exactly the minimum
        storage
            .liabilities
            .upsert(liability(alice.id, "Payday", 20_000, 12_000, 2_000))
            .unwrap();

        let start = Month::new(2025, 1).unwrap();
        let report =
            DebtReport::generate(&storage, alice.id, PayoffStrategy::Avalanche, start).unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].name, "Payday");
        assert_eq!(report.rows[0].months_to_payoff, None);

        let family = &report.rows[1];
        assert_eq!(family.months_to_payoff, Some(12));
        assert_eq!(family.payoff_month, Some(Month::new(2026, 1).unwrap()));
        assert_eq!(family.interest_to_payoff, Some(Money::zero()));
        assert_eq!(report.summary.total_balance.cents(), 140_000);

        let text = report.format_terminal();
        assert!(text.contains("never"));

        let mut csv = Vec::new();
        report.export_csv(&mut csv).unwrap();
        let csv = String::from_utf8(csv).unwrap();
        assert!(csv.contains("2,Family loan,Personal Loan,1200.00,0.00,100.00,12,2026-01,0.00"));
    }

    #[test]
    fn test_empty_debt_report() {
        let (_temp_dir, storage) = create_test_storage();
        let alice = register(&storage, "alice");
        let report = DebtReport::generate(
            &storage,
            alice.id,
            PayoffStrategy::Snowball,
            Month::new(2025, 1).unwrap(),
        )
        .unwrap();
        assert!(report.format_terminal().contains("No open debts"));
    }
}
