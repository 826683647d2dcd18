//! Descriptive statistics over `f64` samples

use serde::Serialize;

/// Standard deviations below this are treated as zero
const EPSILON: f64 = 1e-9;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 denominator)
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(sum_sq / (values.len() - 1) as f64)
}

/// Sample standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// How many standard deviations `value` lies from `mean`
///
/// `None` when the spread is effectively zero.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> Option<f64> {
    if std_dev.abs() < EPSILON {
        return None;
    }
    Some((value - mean) / std_dev)
}

/// Trailing moving average; output has `len - window + 1` entries
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }
    values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Percentile with linear interpolation between closest ranks (`p` in 0..=100)
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Zero for a single value
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

pub fn summarize(values: &[f64]) -> Option<Summary> {
    Some(Summary {
        count: values.len(),
        mean: mean(values)?,
        std_dev: std_dev(values).unwrap_or(0.0),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        median: median(values)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert!(approx(variance(&values).unwrap(), 32.0 / 7.0));
        assert!(approx(std_dev(&values).unwrap(), (32.0f64 / 7.0).sqrt()));

        assert_eq!(mean(&[]), None);
        assert_eq!(variance(&[1.0]), None);
    }

    #[test]
    fn test_median_and_percentile() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(percentile(&[10.0, 20.0, 30.0, 40.0, 50.0], 0.0), Some(10.0));
        assert_eq!(percentile(&[10.0, 20.0, 30.0, 40.0, 50.0], 100.0), Some(50.0));
        assert_eq!(percentile(&[10.0, 20.0], 25.0), Some(12.5));
        assert_eq!(percentile(&[1.0], 101.0), None);
    }

    #[test]
    fn test_z_score() {
        assert_eq!(z_score(14.0, 10.0, 2.0), Some(2.0));
        assert_eq!(z_score(6.0, 10.0, 2.0), Some(-2.0));
        assert_eq!(z_score(10.0, 10.0, 0.0), None);
    }

    #[test]
    fn test_moving_average() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(moving_average(&values, 3), vec![2.0, 3.0, 4.0]);
        assert_eq!(moving_average(&values, 5), vec![3.0]);
        assert!(moving_average(&values, 6).is_empty());
        assert!(moving_average(&values, 0).is_empty());
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&[5.0, 1.0, 3.0]).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.mean, 3.0);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 5.0);
        assert_eq!(summary.median, 3.0);
        assert!(approx(summary.std_dev, 2.0));

        let single = summarize(&[7.0]).unwrap();
        assert_eq!(single.std_dev, 0.0);
        assert!(summarize(&[]).is_none());
    }
}
