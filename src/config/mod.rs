//! Configuration module for fintrack
//!
//! This module provides configuration management including:
//! - Path resolution for data, settings and the audit log
//! - User settings persistence
//! - Insight and server tuning

pub mod paths;
pub mod settings;

pub use paths::FintrackPaths;
pub use settings::{InsightSettings, ServerSettings, Settings};
