//! Terminal User Interface module
//!
//! A read-only ratatui dashboard over one user's data: the month's totals,
//! transactions, budgets, goals, debts and insights, one tab each.

pub mod app;
pub mod event;
pub mod handler;
pub mod layout;
pub mod terminal;
pub mod views;

pub use app::{App, Tab};
pub use terminal::run_tui;
