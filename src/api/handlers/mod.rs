//! Route handlers, one module per resource

pub mod budgets;
pub mod categories;
pub mod family;
pub mod goals;
pub mod insights;
pub mod liabilities;
pub mod transactions;

use serde::Serialize;

use crate::error::{FintrackError, FintrackResult};
use crate::models::Month;

use super::response::{ok, ApiResult};

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> ApiResult<Health> {
    ok(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Parse an optional `YYYY-MM` query value, defaulting to this month
pub(crate) fn month_or_current(value: Option<&str>) -> FintrackResult<Month> {
    match value {
        Some(s) => Month::parse(s).map_err(|e| FintrackError::Validation(e.to_string())),
        None => Ok(Month::current()),
    }
}

pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
