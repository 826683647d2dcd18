//! CLI command handlers
//!
//! This module contains the implementation of CLI commands, bridging the
//! clap argument parsing with the service layer. Handlers print their
//! results and return `FintrackResult`; `main` turns errors into a message
//! and exit code.

pub mod audit;
pub mod auth;
pub mod budget;
pub mod category;
pub mod export;
pub mod family;
pub mod goal;
pub mod insights;
pub mod liability;
pub mod report;
pub mod session;
pub mod transaction;

pub use audit::{handle_audit_command, AuditArgs};
pub use auth::{handle_auth_command, AuthCommands};
pub use budget::{handle_budget_command, BudgetCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use export::{handle_export_command, ExportCommands};
pub use family::{handle_family_command, FamilyCommands};
pub use goal::{handle_goal_command, GoalCommands};
pub use insights::{handle_insights_command, InsightCommands};
pub use liability::{handle_debt_command, DebtCommands};
pub use report::{handle_report_command, ReportCommands};
pub use session::{clear_session, require_user, save_session};
pub use transaction::{handle_transaction_command, TransactionCommands};

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::crypto::SecureString;
use crate::error::{FintrackError, FintrackResult};
use crate::models::{CategoryId, Money, Month, UserId};
use crate::services::CategoryService;
use crate::storage::Storage;

/// Environment variable consulted before prompting for a password
pub const PASSWORD_ENV: &str = "FINTRACK_PASSWORD";

/// Parse an amount that must be greater than zero
pub(crate) fn parse_amount(s: &str) -> FintrackResult<Money> {
    let amount = Money::parse(s).map_err(|e| {
        FintrackError::Validation(format!(
            "Invalid amount: '{}'. Use a form like '50' or '1,250.00' ({})",
            s, e
        ))
    })?;
    if !amount.is_positive() {
        return Err(FintrackError::Validation(format!(
            "Amount must be greater than zero: '{}'",
            s
        )));
    }
    Ok(amount)
}

/// Parse an amount that may be negative (withdrawals, adjustments)
pub(crate) fn parse_signed_amount(s: &str) -> FintrackResult<Money> {
    Money::parse(s).map_err(|e| FintrackError::Validation(format!("Invalid amount '{}': {}", s, e)))
}

/// Parse a YYYY-MM-DD date, defaulting to today
pub(crate) fn parse_date(s: Option<&str>) -> FintrackResult<NaiveDate> {
    match s {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            FintrackError::Validation(format!("Invalid date: '{}'. Use YYYY-MM-DD", s))
        }),
        None => Ok(today()),
    }
}

/// Parse a YYYY-MM month, defaulting to the current month
pub(crate) fn parse_month(s: Option<&str>) -> FintrackResult<Month> {
    match s {
        Some(s) => Month::parse(s).map_err(|e| FintrackError::Validation(e.to_string())),
        None => Ok(Month::current()),
    }
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Read a password from the environment, or prompt without echo
pub(crate) fn read_password(prompt: &str, from_env: Option<String>) -> FintrackResult<SecureString> {
    if let Some(password) = from_env.filter(|p| !p.is_empty()) {
        return Ok(SecureString::new(password));
    }
    rpassword::prompt_password(prompt)
        .map(SecureString::new)
        .map_err(|e| FintrackError::Io(format!("Failed to read password: {}", e)))
}

/// Names of every category the user can see, for display lookups
pub(crate) fn category_names(
    storage: &Storage,
    user_id: UserId,
) -> FintrackResult<HashMap<CategoryId, String>> {
    Ok(CategoryService::new(storage)
        .list_visible(user_id)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

/// Print a value as pretty JSON (for `--json` flags)
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> FintrackResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.50").unwrap().cents(), 1250);
        assert_eq!(parse_amount("$1,000").unwrap().cents(), 100_000);
        assert!(parse_amount("0").unwrap_err().is_validation());
        assert!(parse_amount("-5").unwrap_err().is_validation());
        assert!(parse_amount("abc").is_err());
        assert_eq!(parse_signed_amount("-5").unwrap().cents(), -500);
    }

    #[test]
    fn test_parse_date_and_month() {
        assert_eq!(
            parse_date(Some("2025-02-28")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert!(parse_date(Some("28/02/2025")).is_err());
        assert_eq!(parse_date(None).unwrap(), today());
        assert_eq!(parse_month(Some("2025-02")).unwrap(), Month::new(2025, 2).unwrap());
        assert!(parse_month(Some("2025-13")).is_err());
    }
}
