//! k-means over dense vectors.
//!
//! # Algorithm
//!
//! 1. **Seeding** (k-means++): the first centroid is a uniformly random
//!    point; each further centroid is drawn with probability proportional to
//!    its squared distance from the nearest centroid chosen so far.
//! 2. **Lloyd iterations**: assign every point to its nearest centroid
//!    (lowest index wins ties), then move each centroid to the mean of its
//!    points. A centroid that loses all its points stays where it was.
//! 3. Stop when no assignment changes or after `max_iterations`.
//!
//! The generator is a seeded `StdRng`, so the same input and seed always
//! give the same clustering.

use std::collections::BTreeMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tia_core::config::ClusterConfig;
use tracing::{debug, instrument};

use crate::error::ClusterError;

/// Parameters for [`kmeans`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KMeansConfig {
    pub clusters: usize,
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            clusters: 7,
            max_iterations: 300,
            seed: 42,
        }
    }
}

impl From<&ClusterConfig> for KMeansConfig {
    fn from(cfg: &ClusterConfig) -> Self {
        Self {
            clusters: cfg.clusters,
            max_iterations: cfg.max_iterations,
            seed: cfg.seed,
        }
    }
}

/// Cluster assignment of every input point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clustering {
    /// Cluster id per point, in input order.
    pub assignments: Vec<usize>,
    /// Lloyd iterations run.
    pub iterations: usize,
    /// Whether assignments stopped changing before the iteration budget.
    pub converged: bool,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
}

impl Clustering {
    /// Point indices grouped by cluster id. Empty clusters are omitted.
    #[must_use]
    pub fn groups(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (point, &cluster) in self.assignments.iter().enumerate() {
            groups.entry(cluster).or_default().push(point);
        }
        groups
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index and squared distance of the centroid nearest to `point`.
fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn seed_centroids(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())].clone());

    let mut d2: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        // All remaining mass at zero means every point coincides with a
        // centroid; fall back to a uniform pick.
        let next = match WeightedIndex::new(&d2) {
            Ok(weights) => weights.sample(rng),
            Err(_) => rng.gen_range(0..points.len()),
        };
        let centroid = points[next].clone();
        for (d, p) in d2.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

/// Partition `points` into `config.clusters` groups.
///
/// All points must have the same dimension.
///
/// # Errors
///
/// Returns [`ClusterError::TooFewDocuments`] when there are fewer points than
/// clusters, or no clusters were requested.
#[instrument(skip(points), fields(points = points.len()))]
#[allow(clippy::cast_precision_loss)]
pub fn kmeans(points: &[Vec<f64>], config: &KMeansConfig) -> Result<Clustering, ClusterError> {
    let k = config.clusters;
    if k == 0 || points.len() < k {
        return Err(ClusterError::TooFewDocuments {
            clusters: k,
            documents: points.len(),
        });
    }

    let dim = points[0].len();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut centroids = seed_centroids(points, k, &mut rng);
    let mut assignments = vec![usize::MAX; points.len()];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;

        let mut changed = false;
        for (slot, point) in assignments.iter_mut().zip(points) {
            let (cluster, _) = nearest(point, &centroids);
            if *slot != cluster {
                *slot = cluster;
                changed = true;
            }
        }
        if !changed {
            converged = true;
            break;
        }

        let mut sums = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];
        for (&cluster, point) in assignments.iter().zip(points) {
            counts[cluster] += 1;
            for (s, x) in sums[cluster].iter_mut().zip(point) {
                *s += x;
            }
        }
        for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
            if count > 0 {
                *centroid = sum.into_iter().map(|s| s / count as f64).collect();
            }
        }
    }

    let inertia = assignments
        .iter()
        .zip(points)
        .map(|(&c, p)| squared_distance(p, &centroids[c]))
        .sum();

    debug!(iterations, converged, inertia, "k-means finished");
    Ok(Clustering {
        assignments,
        iterations,
        converged,
        inertia,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.0],
            vec![10.0, 10.1],
        ]
    }

    fn config(clusters: usize) -> KMeansConfig {
        KMeansConfig {
            clusters,
            ..KMeansConfig::default()
        }
    }

    #[test]
    fn separates_two_blobs() {
        let result = kmeans(&blobs(), &config(2)).expect("cluster");
        let a = result.assignments[0];
        let b = result.assignments[3];
        assert_ne!(a, b);
        assert_eq!(result.assignments, [a, a, a, b, b, b]);
        assert!(result.converged);
    }

    #[test]
    fn same_seed_same_result() {
        let first = kmeans(&blobs(), &config(3)).expect("cluster");
        let second = kmeans(&blobs(), &config(3)).expect("cluster");
        assert_eq!(first, second);
    }

    #[test]
    fn more_clusters_than_points_is_an_error() {
        let err = kmeans(&blobs(), &config(7)).expect_err("too few");
        assert!(matches!(
            err,
            ClusterError::TooFewDocuments {
                clusters: 7,
                documents: 6
            }
        ));
        assert!(kmeans(&blobs(), &config(0)).is_err());
    }

    #[test]
    fn identical_points_still_seed_every_cluster() {
        let points = vec![vec![1.0, 1.0]; 4];
        let result = kmeans(&points, &config(3)).expect("cluster");
        assert_eq!(result.assignments.len(), 4);
        assert!(result.inertia.abs() < 1e-12);
    }

    #[test]
    fn groups_list_points_per_cluster() {
        let result = kmeans(&blobs(), &config(2)).expect("cluster");
        let groups = result.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.values().map(Vec::len).sum::<usize>(), 6);
    }
}
