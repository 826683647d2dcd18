//! fintrack - personal finance tracking from the terminal
//!
//! This library provides the core of the fintrack application: income and
//! expense transactions, per-category monthly budgets with transfers,
//! savings goals, debts with payoff planning, family groups that share
//! budgets, and statistical spending insights.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (users, transactions, budgets, goals, etc.)
//! - `analytics`: Statistics helpers (z-scores, regression, k-means)
//! - `storage`: JSON file storage layer
//! - `audit`: Audit logging system
//! - `crypto`: Password hashing and session tokens
//! - `services`: Business logic layer
//! - `reports`, `export`, `display`: Output for the CLI and files
//! - `cli`, `tui`: The command line and the dashboard
//! - `api`: HTTP server (feature `server`)
//!
//! # Example
//!
//! ```rust,ignore
//! use fintrack::config::{paths::FintrackPaths, settings::Settings};
//! use fintrack::storage::Storage;
//!
//! let paths = FintrackPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths)?;
//! ```

pub mod analytics;
pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;
pub mod tui;

#[cfg(feature = "server")]
pub mod api;

pub use error::{FintrackError, FintrackResult};
