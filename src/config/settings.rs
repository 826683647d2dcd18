//! User settings for fintrack
//!
//! Manages preferences, authentication policy, insight thresholds and the
//! HTTP server bind address.

use serde::{Deserialize, Serialize};

use super::paths::FintrackPaths;
use crate::error::FintrackError;

/// Tuning knobs for the statistical insights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightSettings {
    /// Flag spending whose z-score within its category exceeds this
    #[serde(default = "default_zscore_threshold")]
    pub zscore_threshold: f64,

    /// Number of preceding transactions in the moving average
    #[serde(default = "default_moving_average_window")]
    pub moving_average_window: usize,

    /// Relative deviation above the moving average that counts as unusual
    /// (1.0 = twice the average)
    #[serde(default = "default_deviation_threshold")]
    pub deviation_threshold: f64,

    /// Minimum transactions in a category before z-scores are trusted
    #[serde(default = "default_min_history")]
    pub min_history: usize,

    /// Number of spending clusters
    #[serde(default = "default_cluster_count")]
    pub cluster_count: usize,

    #[serde(default = "default_kmeans_max_iterations")]
    pub kmeans_max_iterations: usize,

    /// Months to project forward in trend reports
    #[serde(default = "default_forecast_months")]
    pub forecast_months: usize,

    /// Months of history used for trends and clusters
    #[serde(default = "default_trend_months")]
    pub trend_months: usize,
}

fn default_zscore_threshold() -> f64 {
    2.0
}

fn default_moving_average_window() -> usize {
    3
}

fn default_deviation_threshold() -> f64 {
    1.0
}

fn default_min_history() -> usize {
    5
}

fn default_cluster_count() -> usize {
    3
}

fn default_kmeans_max_iterations() -> usize {
    50
}

fn default_forecast_months() -> usize {
    3
}

fn default_trend_months() -> usize {
    6
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            zscore_threshold: default_zscore_threshold(),
            moving_average_window: default_moving_average_window(),
            deviation_threshold: default_deviation_threshold(),
            min_history: default_min_history(),
            cluster_count: default_cluster_count(),
            kmeans_max_iterations: default_kmeans_max_iterations(),
            forecast_months: default_forecast_months(),
            trend_months: default_trend_months(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// User settings for fintrack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Default currency symbol
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Percent of a budget's limit at which it is reported as near the limit
    #[serde(default = "default_alert_threshold")]
    pub default_alert_threshold: u8,

    /// Lifetime of a login session
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    #[serde(default)]
    pub insights: InsightSettings,

    #[serde(default)]
    pub server: ServerSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_alert_threshold() -> u8 {
    80
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

fn default_min_password_length() -> usize {
    8
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            date_format: default_date_format(),
            default_alert_threshold: default_alert_threshold(),
            session_ttl_hours: default_session_ttl_hours(),
            min_password_length: default_min_password_length(),
            insights: InsightSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &FintrackPaths) -> Result<Self, FintrackError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| FintrackError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| FintrackError::Config(format!("Failed to parse settings file: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &FintrackPaths) -> Result<(), FintrackError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| FintrackError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| FintrackError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Reject values the services cannot work with
    pub fn validate(&self) -> Result<(), FintrackError> {
        if !(1..=100).contains(&self.default_alert_threshold) {
            return Err(FintrackError::Config(
                "default_alert_threshold must be between 1 and 100".into(),
            ));
        }
        if self.session_ttl_hours <= 0 {
            return Err(FintrackError::Config(
                "session_ttl_hours must be positive".into(),
            ));
        }
        if self.insights.moving_average_window == 0 || self.insights.cluster_count == 0 {
            return Err(FintrackError::Config(
                "moving_average_window and cluster_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
