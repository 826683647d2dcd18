//! Reports module for fintrack
//!
//! Each report is generated from storage for one user, renders as a
//! fixed-width terminal table and can be written out as CSV.

pub mod budget_overview;
pub mod cash_flow;
pub mod debt;
pub mod spending;

pub use budget_overview::{BudgetReport, BudgetReportRow};
pub use cash_flow::{CashFlowReport, CashFlowRow};
pub use debt::{DebtReport, DebtReportRow};
pub use spending::{SpendingByCategory, SpendingReport};

use crate::error::FintrackError;

pub(crate) fn write_error(e: std::io::Error) -> FintrackError {
    FintrackError::Export(e.to_string())
}
