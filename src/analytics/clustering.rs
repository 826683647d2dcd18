//! K-Means clustering
//!
//! Seeding is deterministic (evenly spaced quantiles of the distinct points
//! ordered by their first feature), so the same data always yields the same
//! clusters.

use serde::Serialize;

use super::stats;
use super::AnalyticsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KMeans {
    /// Requested number of clusters
    pub k: usize,
    pub max_iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KMeansResult {
    pub centroids: Vec<Vec<f64>>,
    /// Cluster index for each input point, in input order
    pub assignments: Vec<usize>,
    pub iterations: usize,
    /// Sum of squared distances from each point to its centroid
    pub inertia: f64,
}

impl KMeansResult {
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Number of points in each cluster
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &c in &self.assignments {
            sizes[c] += 1;
        }
        sizes
    }
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: 100,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Cluster `points`; every point must have the same non-zero dimension
    ///
    /// `k` is reduced to the number of distinct points when there are fewer.
    pub fn fit(&self, points: &[Vec<f64>]) -> Result<KMeansResult, AnalyticsError> {
        if self.k == 0 {
            return Err(AnalyticsError::ZeroClusters);
        }
        let dim = points.first().map(Vec::len).ok_or(AnalyticsError::EmptyInput)?;
        if dim == 0 {
            return Err(AnalyticsError::EmptyInput);
        }
        if let Some(bad) = points.iter().find(|p| p.len() != dim) {
            return Err(AnalyticsError::DimensionMismatch {
                expected: dim,
                found: bad.len(),
            });
        }

        let mut centroids = seed_centroids(points, self.k);
        let mut assignments = assign(points, &centroids);
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;
            centroids = recompute(points, &assignments, &centroids);
            let next = assign(points, &centroids);
            if next == assignments {
                break;
            }
            assignments = next;
        }

        let inertia = points
            .iter()
            .zip(&assignments)
            .map(|(p, &c)| distance_squared(p, &centroids[c]))
            .sum();

        Ok(KMeansResult {
            centroids,
            assignments,
            iterations,
            inertia,
        })
    }
}

fn seed_centroids(points: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    let mut distinct: Vec<&Vec<f64>> = points.iter().collect();
    distinct.sort_by(|a, b| {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    distinct.dedup();

    let d = distinct.len();
    let k = k.min(d);
    if k == 1 {
        return vec![distinct[d / 2].clone()];
    }
    // Positions are strictly increasing because k <= d
    (0..k)
        .map(|i| distinct[i * (d - 1) / (k - 1)].clone())
        .collect()
}

fn assign(points: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<usize> {
    points.iter().map(|p| nearest(p, centroids)).collect()
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = distance_squared(point, c);
        if d < best_distance {
            best = i;
            best_distance = d;
        }
    }
    best
}

/// Mean of each cluster; an empty cluster keeps its previous centroid
fn recompute(points: &[Vec<f64>], assignments: &[usize], previous: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let dim = previous.first().map(Vec::len).unwrap_or(0);
    let mut sums = vec![vec![0.0; dim]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (point, &c) in points.iter().zip(assignments) {
        counts[c] += 1;
        for (sum, value) in sums[c].iter_mut().zip(point) {
            *sum += value;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), prev)| {
            if count == 0 {
                prev.clone()
            } else {
                sum.into_iter().map(|s| s / count as f64).collect()
            }
        })
        .collect()
}

fn distance_squared(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Z-normalise each column; zero-variance columns become all zeros
pub fn standardize(points: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let dim = points.first().map(Vec::len).unwrap_or(0);
    let columns: Vec<(f64, Option<f64>)> = (0..dim)
        .map(|j| {
            let column: Vec<f64> = points.iter().map(|p| p[j]).collect();
            let mean = stats::mean(&column).unwrap_or(0.0);
            let sd = stats::std_dev(&column).filter(|sd| *sd > 1e-9);
            (mean, sd)
        })
        .collect();

    points
        .iter()
        .map(|p| {
            p.iter()
                .zip(&columns)
                .map(|(v, (mean, sd))| match sd {
                    Some(sd) => (v - mean) / sd,
                    None => 0.0,
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(values: &[(f64, f64)]) -> Vec<Vec<f64>> {
        values.iter().map(|(a, b)| vec![*a, *b]).collect()
    }

    #[test]
    fn test_two_obvious_clusters() {
        let points = pts(&[
            (1.0, 1.0),
            (1.5, 2.0),
            (1.2, 1.1),
            (10.0, 10.0),
            (10.5, 9.5),
            (9.8, 10.2),
        ]);
        let result = KMeans::new(2).fit(&points).unwrap();

        assert_eq!(result.k(), 2);
        let a = result.assignments[0];
        assert!(result.assignments[..3].iter().all(|&c| c == a));
        assert!(result.assignments[3..].iter().all(|&c| c != a));
        assert_eq!(result.sizes(), vec![3, 3]);
        assert!(result.inertia < 5.0);
    }

    #[test]
    fn test_deterministic() {
        let points = pts(&[(5.0, 1.0), (1.0, 2.0), (3.0, 3.0), (8.0, 1.0), (2.0, 9.0)]);
        let a = KMeans::new(3).fit(&points).unwrap();
        let b = KMeans::new(3).fit(&points).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_k_clamped_to_distinct_points() {
        let points = pts(&[(1.0, 1.0), (1.0, 1.0), (2.0, 2.0)]);
        let result = KMeans::new(5).fit(&points).unwrap();
        assert_eq!(result.k(), 2);
        assert_eq!(result.assignments[0], result.assignments[1]);
        assert_eq!(result.inertia, 0.0);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            KMeans::new(0).fit(&pts(&[(1.0, 1.0)])),
            Err(AnalyticsError::ZeroClusters)
        );
        assert_eq!(KMeans::new(2).fit(&[]), Err(AnalyticsError::EmptyInput));
        assert_eq!(
            KMeans::new(2).fit(&[vec![1.0, 2.0], vec![1.0]]),
            Err(AnalyticsError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_max_iterations_zero_keeps_seeds() {
        let points = pts(&[(0.0, 0.0), (1.0, 0.0), (10.0, 0.0)]);
        let result = KMeans::new(2).with_max_iterations(0).fit(&points).unwrap();
        assert_eq!(result.iterations, 0);
        assert_eq!(result.centroids, vec![vec![0.0, 0.0], vec![10.0, 0.0]]);
    }

    #[test]
    fn test_standardize() {
        let scaled = standardize(&pts(&[(1.0, 5.0), (3.0, 5.0)]));
        assert!((scaled[0][0] + scaled[1][0]).abs() < 1e-12);
        assert!(scaled[0][0] < 0.0);
        assert_eq!(scaled[0][1], 0.0);
        assert_eq!(scaled[1][1], 0.0);
    }
}
