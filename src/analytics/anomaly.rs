//! Statistical outlier detection for spending
//!
//! Two rules run per group (category), over observations in date order:
//! - z-score: an amount more than `zscore_threshold` standard deviations above
//!   the group mean, once the group has `min_history` observations
//! - moving average: an amount whose relative deviation from the mean of the
//!   preceding `moving_average_window` amounts exceeds `deviation_threshold`

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::stats;

#[derive(Debug, Clone, PartialEq)]
pub struct Observation<I, G> {
    pub id: I,
    pub group: G,
    pub date: NaiveDate,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyReason {
    ZScore,
    MovingAverage,
    Both,
}

impl fmt::Display for AnomalyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZScore => f.pad("z-score"),
            Self::MovingAverage => f.pad("moving average"),
            Self::Both => f.pad("z-score + moving average"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    fn classify(z_score: Option<f64>, deviation: Option<f64>) -> Self {
        let z = z_score.map(f64::abs).unwrap_or(0.0);
        let dev = deviation.unwrap_or(0.0);
        if z >= 3.5 || dev >= 3.0 {
            Self::High
        } else if z >= 2.5 || dev >= 2.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.pad("Low"),
            Self::Medium => f.pad("Medium"),
            Self::High => f.pad("High"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly<I, G> {
    pub id: I,
    pub group: G,
    pub date: NaiveDate,
    pub amount: f64,
    /// Group mean (z-score rule) or window mean (moving-average rule)
    pub expected: f64,
    pub z_score: Option<f64>,
    pub deviation: Option<f64>,
    pub reason: AnomalyReason,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyDetector {
    pub zscore_threshold: f64,
    pub moving_average_window: usize,
    pub deviation_threshold: f64,
    pub min_history: usize,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            zscore_threshold: 2.0,
            moving_average_window: 3,
            deviation_threshold: 1.0,
            min_history: 5,
        }
    }
}

impl AnomalyDetector {
    /// Flag unusual observations, newest first
    pub fn detect<I, G>(&self, observations: &[Observation<I, G>]) -> Vec<Anomaly<I, G>>
    where
        I: Clone,
        G: Clone + Ord,
    {
        let mut groups: BTreeMap<&G, Vec<&Observation<I, G>>> = BTreeMap::new();
        for obs in observations {
            groups.entry(&obs.group).or_default().push(obs);
        }

        let mut anomalies = Vec::new();
        for (_, mut members) in groups {
            members.sort_by_key(|o| o.date);
            anomalies.extend(self.detect_group(&members));
        }

        anomalies.sort_by(|a, b| b.date.cmp(&a.date));
        anomalies
    }

    fn detect_group<I, G>(&self, members: &[&Observation<I, G>]) -> Vec<Anomaly<I, G>>
    where
        I: Clone,
        G: Clone,
    {
        let amounts: Vec<f64> = members.iter().map(|o| o.amount).collect();

        let spread = if amounts.len() >= self.min_history.max(2) {
            stats::mean(&amounts).zip(stats::std_dev(&amounts))
        } else {
            None
        };

        let window = self.moving_average_window;
        let mut anomalies = Vec::new();

        for (i, obs) in members.iter().enumerate() {
            let z = spread.and_then(|(mean, sd)| stats::z_score(obs.amount, mean, sd));
            let z_flag = z.is_some_and(|z| z > self.zscore_threshold);

            let window_mean = if window > 0 && i >= window {
                stats::mean(&amounts[i - window..i]).filter(|m| *m > 0.0)
            } else {
                None
            };
            let deviation = window_mean.map(|m| (obs.amount - m) / m);
            let ma_flag = deviation.is_some_and(|d| d > self.deviation_threshold);

            let reason = match (z_flag, ma_flag) {
                (true, true) => AnomalyReason::Both,
                (true, false) => AnomalyReason::ZScore,
                (false, true) => AnomalyReason::MovingAverage,
                (false, false) => continue,
            };

            let expected = if z_flag {
                spread.map(|(mean, _)| mean).unwrap_or(obs.amount)
            } else {
                window_mean.unwrap_or(obs.amount)
            };

            anomalies.push(Anomaly {
                id: obs.id.clone(),
                group: obs.group.clone(),
                date: obs.date,
                amount: obs.amount,
                expected,
                z_score: z,
                deviation,
                reason,
                severity: Severity::classify(z, deviation),
            });
        }

        anomalies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(id: u32, group: &'static str, day: u32, amount: f64) -> Observation<u32, &'static str> {
        Observation {
            id,
            group,
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            amount,
        }
    }

    #[test]
    fn test_zscore_flags_high_spend() {
        let mut data: Vec<_> = (1..=9).map(|d| obs(d, "food", d, 50.0 + d as f64)).collect();
        data.push(obs(10, "food", 10, 400.0));

        let detector = AnomalyDetector {
            moving_average_window: 0,
            ..Default::default()
        };
        let anomalies = detector.detect(&data);

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].id, 10);
        assert_eq!(anomalies[0].reason, AnomalyReason::ZScore);
        assert!(anomalies[0].z_score.unwrap() > 2.0);
    }

    #[test]
    fn test_low_outliers_not_flagged() {
        let mut data: Vec<_> = (1..=9).map(|d| obs(d, "food", d, 100.0)).collect();
        data.push(obs(10, "food", 10, 1.0));
        let detector = AnomalyDetector {
            zscore_threshold: 1.0,
            ..Default::default()
        };
        assert!(detector.detect(&data).is_empty());
    }

    #[test]
    fn test_min_history_gates_zscore() {
        let data = vec![
            obs(1, "fun", 1, 10.0),
            obs(2, "fun", 2, 10.0),
            obs(3, "fun", 3, 500.0),
        ];
        let detector = AnomalyDetector {
            zscore_threshold: 0.5,
            moving_average_window: 0,
            min_history: 5,
            ..Default::default()
        };
        assert!(detector.detect(&data).is_empty());
    }

    #[test]
    fn test_moving_average_rule() {
        let data = vec![
            obs(1, "gas", 1, 40.0),
            obs(2, "gas", 2, 40.0),
            obs(3, "gas", 3, 40.0),
            obs(4, "gas", 4, 130.0),
        ];
        let anomalies = AnomalyDetector::default().detect(&data);

        assert_eq!(anomalies.len(), 1);
        let a = &anomalies[0];
        assert_eq!(a.reason, AnomalyReason::MovingAverage);
        assert_eq!(a.expected, 40.0);
        assert_eq!(a.deviation, Some(2.25));
        assert_eq!(a.severity, Severity::Medium);
    }

    #[test]
    fn test_groups_are_independent_and_sorted_newest_first() {
        let data = vec![
            obs(1, "a", 1, 10.0),
            obs(2, "a", 2, 10.0),
            obs(3, "a", 3, 10.0),
            obs(4, "a", 4, 50.0),
            obs(5, "b", 5, 1000.0),
            obs(6, "b", 6, 1000.0),
            obs(7, "b", 7, 1000.0),
            obs(8, "b", 8, 5000.0),
        ];
        let anomalies = AnomalyDetector::default().detect(&data);
        let ids: Vec<u32> = anomalies.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![8, 4]);
        assert_eq!(anomalies[0].severity, Severity::High);
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::classify(Some(2.1), None), Severity::Low);
        assert_eq!(Severity::classify(Some(-2.6), None), Severity::Medium);
        assert_eq!(Severity::classify(Some(3.5), None), Severity::High);
        assert_eq!(Severity::classify(None, Some(1.5)), Severity::Low);
        assert_eq!(Severity::classify(None, Some(3.0)), Severity::High);
    }
}
