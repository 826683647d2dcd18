//! Statistics used by the spending insights
//!
//! Pure functions and small models over `f64` data: descriptive statistics,
//! least-squares trends, k-means clustering and outlier detection. Nothing in
//! here touches storage; `services::insights` feeds it.

pub mod anomaly;
pub mod clustering;
pub mod forecast;
pub mod regression;
pub mod stats;

use std::fmt;

pub use anomaly::{Anomaly, AnomalyDetector, AnomalyReason, Observation, Severity};
pub use clustering::{standardize, KMeans, KMeansResult};
pub use forecast::{Trend, TrendDirection};
pub use regression::LinearFit;
pub use stats::Summary;

/// Input errors for the analytics routines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    EmptyInput,
    ZeroClusters,
    DimensionMismatch { expected: usize, found: usize },
}

impl fmt::Display for AnalyticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "No data points"),
            Self::ZeroClusters => write!(f, "Cluster count must be at least 1"),
            Self::DimensionMismatch { expected, found } => write!(
                f,
                "Point dimension mismatch: expected {}, found {}",
                expected, found
            ),
        }
    }
}

impl std::error::Error for AnalyticsError {}
