//! Debt (liability) CLI commands

use clap::Subcommand;

use crate::display::plan::{
    format_debt_summary, format_liability_details, format_liability_list, format_payoff_plan,
};
use crate::error::{FintrackError, FintrackResult};
use crate::models::{LiabilityKind, Month, User};
use crate::services::{CreateLiabilityInput, LiabilityService, PayoffStrategy};
use crate::storage::Storage;

use super::{parse_amount, parse_date, print_json};

/// Debt subcommands
#[derive(Subcommand)]
pub enum DebtCommands {
    /// Track a new debt
    Add {
        /// Name (e.g., "Visa", "Car loan")
        name: String,
        /// Current balance
        balance: String,
        /// credit-card, personal, auto, student, mortgage, medical, other
        #[arg(short, long, default_value = "other")]
        kind: String,
        /// Annual interest rate in percent (e.g., "19.99")
        #[arg(short, long, default_value = "0")]
        apr: String,
        /// Minimum monthly payment
        #[arg(short, long, default_value = "0")]
        minimum: String,
        #[arg(short, long, default_value = "")]
        lender: String,
        /// Day of month the payment is due
        #[arg(long)]
        due_day: Option<u8>,
        /// Credit limit (credit cards)
        #[arg(long)]
        credit_limit: Option<String>,
        /// Date opened (YYYY-MM-DD)
        #[arg(long)]
        opened: Option<String>,
    },

    /// List debts
    List {
        /// Include paid-off debts
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },

    /// Record a payment
    Pay {
        /// Debt name or ID
        debt: String,
        amount: String,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long, default_value = "")]
        note: String,
    },

    /// Show details and the amortisation schedule at a payment
    Payoff {
        /// Debt name or ID
        debt: String,
        /// Monthly payment (defaults to the minimum)
        #[arg(short, long)]
        payment: Option<String>,
        /// Print the payment schedule
        #[arg(long)]
        schedule: bool,
    },

    /// Totals across open debts
    Summary {
        #[arg(long)]
        json: bool,
    },

    /// The order a payoff strategy would attack debts in
    Order {
        /// avalanche (highest APR first) or snowball (smallest balance first)
        #[arg(short, long, default_value = "avalanche")]
        strategy: String,
    },

    /// Stop tracking a debt
    Delete {
        /// Debt name or ID
        debt: String,
    },
}

/// Parse "19.99" into 1999 basis points
fn parse_apr(s: &str) -> FintrackResult<u32> {
    let pct: f64 = s
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|_| FintrackError::Validation(format!("Invalid APR: '{}'", s)))?;
    if !(0.0..=100.0).contains(&pct) {
        return Err(FintrackError::Validation(format!(
            "APR must be between 0 and 100: '{}'",
            s
        )));
    }
    Ok((pct * 100.0).round() as u32)
}

/// Minimum payments may be zero (e.g. a deferred student loan)
fn parse_minimum(s: &str) -> FintrackResult<crate::models::Money> {
    let amount = super::parse_signed_amount(s)?;
    if amount.is_negative() {
        return Err(FintrackError::Validation(
            "Minimum payment cannot be negative".into(),
        ));
    }
    Ok(amount)
}

/// Handle a debt command
pub fn handle_debt_command(
    storage: &Storage,
    user: &User,
    cmd: DebtCommands,
) -> FintrackResult<()> {
    let service = LiabilityService::new(storage);

    match cmd {
        DebtCommands::Add {
            name,
            balance,
            kind,
            apr,
            minimum,
            lender,
            due_day,
            credit_limit,
            opened,
        } => {
            let kind: LiabilityKind = kind.parse().map_err(FintrackError::Validation)?;
            let liability = service.create(
                user.id,
                CreateLiabilityInput {
                    name,
                    kind,
                    balance: parse_amount(&balance)?,
                    apr_bps: parse_apr(&apr)?,
                    minimum_payment: parse_minimum(&minimum)?,
                    lender,
                    due_day,
                    credit_limit: credit_limit.as_deref().map(parse_amount).transpose()?,
                    opened_on: opened.as_deref().map(|d| parse_date(Some(d))).transpose()?,
                },
            )?;
            println!("Tracking {}: {}", liability.kind, liability);
            println!("  ID: {}", liability.id);
        }

        DebtCommands::List { all, json } => {
            let liabilities = service.list(user.id, all)?;
            if json {
                print_json(&liabilities)?;
            } else {
                print!("{}", format_liability_list(&liabilities));
            }
        }

        DebtCommands::Pay {
            debt,
            amount,
            date,
            note,
        } => {
            let liability = service.find(user.id, &debt)?;
            let (updated, payment) = service.record_payment(
                user.id,
                liability.id,
                parse_amount(&amount)?,
                parse_date(date.as_deref())?,
                &note,
            )?;
            println!(
                "Paid {} on '{}' ({} interest, {} principal)",
                payment.amount, updated.name, payment.interest, payment.principal
            );
            if updated.closed {
                println!("  Paid off!");
            } else {
                println!("  Remaining balance: {}", updated.current_balance);
            }
        }

        DebtCommands::Payoff {
            debt,
            payment,
            schedule,
        } => {
            let liability = service.find(user.id, &debt)?;
            print!("{}", format_liability_details(&liability));
            println!();

            let payment = payment.as_deref().map(parse_amount).transpose()?;
            let plan = service.payoff_plan(user.id, liability.id, payment, Month::current())?;
            if schedule {
                print!("{}", format_payoff_plan(&liability.name, &plan));
            } else {
                println!(
                    "Paid off in {} months ({}); total interest {}",
                    plan.months, plan.payoff_month, plan.total_interest
                );
            }
        }

        DebtCommands::Summary { json } => {
            let summary = service.summary(user.id)?;
            if json {
                print_json(&summary)?;
            } else {
                print!("{}", format_debt_summary(&summary));
            }
        }

        DebtCommands::Order { strategy } => {
            let strategy: PayoffStrategy = strategy.parse().map_err(FintrackError::Validation)?;
            let ordered = service.payoff_order(user.id, strategy)?;
            if ordered.is_empty() {
                println!("No open debts.");
                return Ok(());
            }
            println!("Payoff order ({}):", strategy);
            for (i, liability) in ordered.iter().enumerate() {
                println!(
                    "  {}. {:<24} {:>12}  {:>6.2}% APR  min {}",
                    i + 1,
                    liability.name,
                    liability.current_balance,
                    liability.apr() * 100.0,
                    liability.minimum_payment
                );
            }
        }

        DebtCommands::Delete { debt } => {
            let liability = service.find(user.id, &debt)?;
            let deleted = service.delete(user.id, liability.id)?;
            println!("Deleted debt: {}", deleted.name);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_apr() {
        assert_eq!(parse_apr("19.99").unwrap(), 1999);
        assert_eq!(parse_apr("5%").unwrap(), 500);
        assert_eq!(parse_apr("0").unwrap(), 0);
        assert!(parse_apr("150").is_err());
        assert!(parse_apr("abc").is_err());
    }
}
