//! Export module for fintrack
//!
//! Exports one user's data in several formats:
//! - CSV: transactions (re-importable) and budgets, for spreadsheets
//! - JSON: schema-versioned snapshot of everything the user owns
//! - YAML: the same snapshot in a human-readable form

pub mod csv;
pub mod json;
pub mod yaml;

pub use csv::{export_budgets_csv, export_transactions_csv};
pub use json::{export_user_json, import_from_json, UserExport, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_user_yaml, import_from_yaml};

use crate::error::FintrackError;

pub(crate) fn write_error(e: impl std::fmt::Display) -> FintrackError {
    FintrackError::Export(e.to_string())
}

/// Quote a CSV field when it contains a separator, quote or newline
pub(crate) fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
