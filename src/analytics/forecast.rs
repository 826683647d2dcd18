//! Linear trend and short-range forecast over a monthly series

use serde::Serialize;
use std::fmt;

use super::regression::LinearFit;
use super::stats;

/// A slope smaller than this share of the series mean counts as flat
const STABLE_SLOPE_RATIO: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rising => f.pad("Rising"),
            Self::Falling => f.pad("Falling"),
            Self::Stable => f.pad("Stable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub fit: LinearFit,
    /// Fitted change per month
    pub monthly_change: f64,
    /// Projected values for the months after the series, never negative
    pub forecast: Vec<f64>,
}

impl Trend {
    /// Fit `values` (oldest first) and project `horizon` further months
    ///
    /// `None` when the series has fewer than two points.
    pub fn from_series(values: &[f64], horizon: usize) -> Option<Self> {
        let fit = LinearFit::fit_series(values)?;
        let mean = stats::mean(values)?;

        let direction = if fit.slope.abs() < mean.abs() * STABLE_SLOPE_RATIO
            || fit.slope.abs() < f64::EPSILON
        {
            TrendDirection::Stable
        } else if fit.slope > 0.0 {
            TrendDirection::Rising
        } else {
            TrendDirection::Falling
        };

        let n = values.len();
        let forecast = (0..horizon)
            .map(|i| fit.predict((n + i) as f64).max(0.0))
            .collect();

        Some(Self {
            direction,
            fit,
            monthly_change: fit.slope,
            forecast,
        })
    }
}
