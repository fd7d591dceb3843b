//! Seeded k-means over chroma feature vectors.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chroma::ChromaVector;

/// Output of a clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// One label per input vector, each in `0..centroids.len()`
    pub labels: Vec<usize>,
    pub centroids: Vec<ChromaVector>,
}

/// Trait for clustering backends.
///
/// Implementations must be deterministic for a given `seed`.
pub trait Clusterer: Send + Sync {
    fn cluster(&self, vectors: &[ChromaVector], k: usize, seed: u64) -> Clustering;
}

/// Lloyd's algorithm with k-means++ seeding and several restarts; the run
/// with the lowest inertia wins.
///
/// Labels are renumbered in order of first appearance, so the first vector
/// always belongs to cluster 0.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub n_init: usize,
    pub max_iter: usize,
    /// Stop once no centroid moves more than this (squared distance)
    pub tolerance: f64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-8,
        }
    }
}

impl Clusterer for KMeans {
    fn cluster(&self, vectors: &[ChromaVector], k: usize, seed: u64) -> Clustering {
        if vectors.is_empty() || k == 0 {
            return Clustering {
                labels: Vec::new(),
                centroids: Vec::new(),
            };
        }
        let k = k.min(vectors.len());
        let mut rng = StdRng::seed_from_u64(seed);

        let mut best: Option<(f64, Clustering)> = None;
        for _ in 0..self.n_init.max(1) {
            let seeds = plus_plus_init(vectors, k, &mut rng);
            let (clustering, inertia) = self.lloyd(vectors, seeds);
            if best.as_ref().map_or(true, |(best_inertia, _)| inertia < *best_inertia) {
                best = Some((inertia, clustering));
            }
        }

        match best {
            Some((_, clustering)) => canonicalize(clustering),
            None => Clustering {
                labels: Vec::new(),
                centroids: Vec::new(),
            },
        }
    }
}

impl KMeans {
    fn lloyd(&self, vectors: &[ChromaVector], mut centroids: Vec<ChromaVector>) -> (Clustering, f64) {
        let mut labels = assign(vectors, &centroids);

        for _ in 0..self.max_iter {
            let updated = update_centroids(vectors, &labels, &centroids);
            let shift = centroids
                .iter()
                .zip(&updated)
                .map(|(a, b)| squared_distance(a, b))
                .fold(0.0, f64::max);
            centroids = updated;
            labels = assign(vectors, &centroids);
            if shift <= self.tolerance {
                break;
            }
        }

        let inertia = vectors
            .iter()
            .zip(&labels)
            .map(|(v, &l)| squared_distance(v, &centroids[l]))
            .sum();

        (Clustering { labels, centroids }, inertia)
    }
}

fn squared_distance(a: &ChromaVector, b: &ChromaVector) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Nearest centroid per vector; ties go to the lower index.
fn assign(vectors: &[ChromaVector], centroids: &[ChromaVector]) -> Vec<usize> {
    vectors
        .iter()
        .map(|v| {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (i, c) in centroids.iter().enumerate() {
                let d = squared_distance(v, c);
                if d < best_dist {
                    best_dist = d;
                    best = i;
                }
            }
            best
        })
        .collect()
}

/// Member means; a cluster that lost all members keeps its old centroid.
fn update_centroids(
    vectors: &[ChromaVector],
    labels: &[usize],
    previous: &[ChromaVector],
) -> Vec<ChromaVector> {
    let mut sums = vec![[0.0; 12]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (v, &l) in vectors.iter().zip(labels) {
        counts[l] += 1;
        for (s, x) in sums[l].iter_mut().zip(v) {
            *s += x;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((mut sum, count), old)| {
            if count == 0 {
                return *old;
            }
            for s in &mut sum {
                *s /= count as f64;
            }
            sum
        })
        .collect()
}

/// k-means++: each further seed is drawn with probability proportional to
/// its squared distance from the seeds chosen so far.
fn plus_plus_init(vectors: &[ChromaVector], k: usize, rng: &mut StdRng) -> Vec<ChromaVector> {
    let mut centroids = vec![vectors[rng.gen_range(0..vectors.len())]];

    while centroids.len() < k {
        let distances: Vec<f64> = vectors
            .iter()
            .map(|v| {
                centroids
                    .iter()
                    .map(|c| squared_distance(v, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = distances.iter().sum();

        let pick = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            distances
                .iter()
                .position(|d| {
                    cumulative += d;
                    cumulative > target
                })
                .unwrap_or(vectors.len() - 1)
        } else {
            // All remaining points coincide with a seed.
            rng.gen_range(0..vectors.len())
        };
        centroids.push(vectors[pick]);
    }

    centroids
}

/// Renumber clusters by first appearance; unused clusters go last.
fn canonicalize(clustering: Clustering) -> Clustering {
    let k = clustering.centroids.len();
    let mut order: Vec<usize> = Vec::with_capacity(k);
    for &l in &clustering.labels {
        if !order.contains(&l) {
            order.push(l);
        }
    }
    for l in 0..k {
        if !order.contains(&l) {
            order.push(l);
        }
    }

    let mut remap = vec![0; k];
    for (new, &old) in order.iter().enumerate() {
        remap[old] = new;
    }

    Clustering {
        labels: clustering.labels.iter().map(|&l| remap[l]).collect(),
        centroids: order.iter().map(|&old| clustering.centroids[old]).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(pc: usize, jitter: f64) -> ChromaVector {
        let mut v = [0.0; 12];
        v[pc] = 1.0 + jitter;
        v
    }

    fn three_groups() -> Vec<ChromaVector> {
        vec![
            point(4, 0.0),
            point(4, 0.01),
            point(0, 0.0),
            point(0, 0.02),
            point(9, 0.0),
            point(4, 0.02),
            point(0, 0.01),
            point(9, 0.01),
        ]
    }

    #[test]
    fn separates_distinct_groups() {
        let result = KMeans::default().cluster(&three_groups(), 3, 42);
        assert_eq!(result.labels, vec![0, 0, 1, 1, 2, 0, 1, 2]);
        assert_eq!(result.centroids.len(), 3);
        assert!((result.centroids[0][4] - 1.01).abs() < 1e-9);
    }

    #[test]
    fn same_seed_same_result() {
        let data = three_groups();
        let a = KMeans::default().cluster(&data, 2, 7);
        let b = KMeans::default().cluster(&data, 2, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn k_larger_than_input_is_clamped() {
        let data = vec![point(0, 0.0), point(5, 0.0)];
        let result = KMeans::default().cluster(&data, 4, 42);
        assert_eq!(result.centroids.len(), 2);
        assert_eq!(result.labels, vec![0, 1]);
    }

    #[test]
    fn identical_points_share_a_cluster() {
        let data = vec![point(2, 0.0); 5];
        let result = KMeans::default().cluster(&data, 2, 42);
        assert!(result.labels.iter().all(|&l| l == 0));
        assert_eq!(result.centroids.len(), 2);
    }

    #[test]
    fn empty_input() {
        let result = KMeans::default().cluster(&[], 3, 42);
        assert!(result.labels.is_empty());
        assert!(result.centroids.is_empty());
    }
}
