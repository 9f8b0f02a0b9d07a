//! Centroid initialization strategies.
//!
//! Each strategy implements [`CentroidSeeder`] and produces `k` seed centroids
//! from a dataset. [`initialize`] then labels every point with its nearest
//! seed using the same assignment rule as a Lloyd step.

use crate::error::KMeansError;
use crate::geometry::{
    assign_labels, check_centroids, check_dataset, points_to_array, squared_distance, Point,
};
use ndarray::{Array1, Array2, ArrayView2};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Produces `k` seed centroids from a dataset
pub trait CentroidSeeder {
    fn seed<R: Rng + ?Sized>(
        &self,
        data: &ArrayView2<f64>,
        k: usize,
        rng: &mut R,
    ) -> Result<Array2<f64>, KMeansError>;
}

/// K distinct points chosen uniformly without replacement
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSeeder;

/// Max-min spreading: each new centroid is the point farthest from all
/// centroids chosen so far
#[derive(Debug, Clone, Copy, Default)]
pub struct FarthestFirstSeeder;

/// KMeans++ sampling proportional to squared distance from the nearest
/// chosen centroid
#[derive(Debug, Clone, Copy, Default)]
pub struct KMeansPlusPlusSeeder;

/// Caller-supplied centroids, used as-is
#[derive(Debug, Clone)]
pub struct ManualSeeder {
    centroids: Array2<f64>,
}

impl ManualSeeder {
    pub fn new(points: &[Point]) -> Self {
        Self {
            centroids: points_to_array(points),
        }
    }

    pub fn from_array(centroids: Array2<f64>) -> Self {
        Self { centroids }
    }
}

fn check_k(n_samples: usize, k: usize) -> Result<(), KMeansError> {
    if k == 0 {
        return Err(KMeansError::InvalidK(
            "k must be greater than 0".to_string(),
        ));
    }
    if k > n_samples {
        return Err(KMeansError::InvalidK(format!(
            "k ({}) exceeds the number of points ({})",
            k, n_samples
        )));
    }
    Ok(())
}

fn gather_rows(data: &ArrayView2<f64>, indices: &[usize]) -> Array2<f64> {
    let mut centroids = Array2::zeros((indices.len(), data.ncols()));
    for (centroid_idx, &data_idx) in indices.iter().enumerate() {
        centroids.row_mut(centroid_idx).assign(&data.row(data_idx));
    }
    centroids
}

/// Lower the running nearest-centroid distances with a newly chosen point
fn update_min_distances(data: &ArrayView2<f64>, chosen_idx: usize, min_sq_dist: &mut [f64]) {
    let chosen = data.row(chosen_idx);
    for (row, best) in data.outer_iter().zip(min_sq_dist.iter_mut()) {
        let d = squared_distance(&row, &chosen);
        if d < *best {
            *best = d;
        }
    }
}

impl CentroidSeeder for RandomSeeder {
    fn seed<R: Rng + ?Sized>(
        &self,
        data: &ArrayView2<f64>,
        k: usize,
        rng: &mut R,
    ) -> Result<Array2<f64>, KMeansError> {
        check_dataset(data)?;
        check_k(data.nrows(), k)?;

        let indices: Vec<usize> = (0..data.nrows()).collect();
        let selected: Vec<usize> = indices.choose_multiple(rng, k).cloned().collect();

        Ok(gather_rows(data, &selected))
    }
}

impl CentroidSeeder for FarthestFirstSeeder {
    fn seed<R: Rng + ?Sized>(
        &self,
        data: &ArrayView2<f64>,
        k: usize,
        rng: &mut R,
    ) -> Result<Array2<f64>, KMeansError> {
        check_dataset(data)?;
        let n_samples = data.nrows();
        check_k(n_samples, k)?;

        let mut selected = Vec::with_capacity(k);
        let mut chosen = vec![false; n_samples];
        let mut min_sq_dist = vec![f64::INFINITY; n_samples];

        let first = rng.gen_range(0..n_samples);
        selected.push(first);
        chosen[first] = true;
        update_min_distances(data, first, &mut min_sq_dist);

        while selected.len() < k {
            let mut best: Option<(usize, f64)> = None;
            for (i, &d) in min_sq_dist.iter().enumerate() {
                if chosen[i] {
                    continue;
                }
                // Strict comparison keeps the first occurrence on ties
                if best.map_or(true, |(_, best_d)| d > best_d) {
                    best = Some((i, d));
                }
            }
            // k <= n guarantees an unchosen point remains
            let Some((next, _)) = best else { break };
            selected.push(next);
            chosen[next] = true;
            update_min_distances(data, next, &mut min_sq_dist);
        }

        Ok(gather_rows(data, &selected))
    }
}

impl CentroidSeeder for KMeansPlusPlusSeeder {
    fn seed<R: Rng + ?Sized>(
        &self,
        data: &ArrayView2<f64>,
        k: usize,
        rng: &mut R,
    ) -> Result<Array2<f64>, KMeansError> {
        check_dataset(data)?;
        let n_samples = data.nrows();
        check_k(n_samples, k)?;

        let mut selected = Vec::with_capacity(k);
        let mut chosen = vec![false; n_samples];
        let mut min_sq_dist = vec![f64::INFINITY; n_samples];

        let first = rng.gen_range(0..n_samples);
        selected.push(first);
        chosen[first] = true;
        update_min_distances(data, first, &mut min_sq_dist);

        while selected.len() < k {
            let weights: Vec<f64> = min_sq_dist
                .iter()
                .zip(chosen.iter())
                .map(|(&d, &c)| if c { 0.0 } else { d })
                .collect();

            let next = match WeightedIndex::new(&weights) {
                Ok(dist) => dist.sample(rng),
                // Every unchosen point coincides with a centroid
                Err(_) => {
                    let remaining: Vec<usize> = (0..n_samples).filter(|&i| !chosen[i]).collect();
                    match remaining.choose(rng) {
                        Some(&i) => i,
                        None => break,
                    }
                }
            };

            selected.push(next);
            chosen[next] = true;
            update_min_distances(data, next, &mut min_sq_dist);
        }

        Ok(gather_rows(data, &selected))
    }
}

impl CentroidSeeder for ManualSeeder {
    fn seed<R: Rng + ?Sized>(
        &self,
        _data: &ArrayView2<f64>,
        k: usize,
        _rng: &mut R,
    ) -> Result<Array2<f64>, KMeansError> {
        if k == 0 {
            return Err(KMeansError::InvalidK(
                "k must be greater than 0".to_string(),
            ));
        }
        if self.centroids.nrows() != k {
            return Err(KMeansError::CentroidCountMismatch {
                expected: k,
                got: self.centroids.nrows(),
            });
        }
        check_centroids(&self.centroids.view())?;
        Ok(self.centroids.clone())
    }
}

/// Name of an initialization strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitStrategy {
    Random,
    FarthestFirst,
    KMeansPlusPlus,
    Manual,
}

impl InitStrategy {
    pub const ALL: [InitStrategy; 4] = [
        InitStrategy::Random,
        InitStrategy::FarthestFirst,
        InitStrategy::KMeansPlusPlus,
        InitStrategy::Manual,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InitStrategy::Random => "Random",
            InitStrategy::FarthestFirst => "Farthest First",
            InitStrategy::KMeansPlusPlus => "KMeans++",
            InitStrategy::Manual => "Manual",
        }
    }
}

impl fmt::Display for InitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InitStrategy {
    type Err = KMeansError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "random" => Ok(InitStrategy::Random),
            "farthestfirst" => Ok(InitStrategy::FarthestFirst),
            "kmeans++" | "kmeansplusplus" | "kmeanspp" => Ok(InitStrategy::KMeansPlusPlus),
            "manual" => Ok(InitStrategy::Manual),
            _ => Err(KMeansError::MalformedInput(format!(
                "unknown initialization method '{}'",
                s
            ))),
        }
    }
}

/// A fully specified initialization request
#[derive(Debug, Clone)]
pub enum InitMethod {
    Random,
    FarthestFirst,
    KMeansPlusPlus,
    Manual(Vec<Point>),
}

impl InitMethod {
    /// Build a method from its name. `manual` is required for
    /// [`InitStrategy::Manual`] and ignored otherwise.
    pub fn new(strategy: InitStrategy, manual: Option<Vec<Point>>) -> Result<Self, KMeansError> {
        Ok(match strategy {
            InitStrategy::Random => InitMethod::Random,
            InitStrategy::FarthestFirst => InitMethod::FarthestFirst,
            InitStrategy::KMeansPlusPlus => InitMethod::KMeansPlusPlus,
            InitStrategy::Manual => InitMethod::Manual(manual.ok_or_else(|| {
                KMeansError::MalformedInput("manual initialization requires centroids".to_string())
            })?),
        })
    }

    pub fn strategy(&self) -> InitStrategy {
        match self {
            InitMethod::Random => InitStrategy::Random,
            InitMethod::FarthestFirst => InitStrategy::FarthestFirst,
            InitMethod::KMeansPlusPlus => InitStrategy::KMeansPlusPlus,
            InitMethod::Manual(_) => InitStrategy::Manual,
        }
    }
}

/// Seed centroids and the labels derived from them
#[derive(Debug, Clone, PartialEq)]
pub struct Initialization {
    pub centroids: Array2<f64>,
    pub labels: Array1<usize>,
}

/// Seed `k` centroids with `method` and label every point by its nearest
/// centroid.
///
/// # Errors
///
/// - `EmptyDataset` if `data` has no rows
/// - `MalformedInput` if `data` is not `(n, 2)` or holds non-finite values
/// - `InvalidK` if `k == 0`, or `k > n` for the sampled strategies
/// - `CentroidCountMismatch` if manual centroids do not number exactly `k`
pub fn initialize<R: Rng + ?Sized>(
    method: &InitMethod,
    data: &ArrayView2<f64>,
    k: usize,
    rng: &mut R,
) -> Result<Initialization, KMeansError> {
    check_dataset(data)?;

    let centroids = match method {
        InitMethod::Random => RandomSeeder.seed(data, k, rng)?,
        InitMethod::FarthestFirst => FarthestFirstSeeder.seed(data, k, rng)?,
        InitMethod::KMeansPlusPlus => KMeansPlusPlusSeeder.seed(data, k, rng)?,
        InitMethod::Manual(points) => ManualSeeder::new(points).seed(data, k, rng)?,
    };

    let labels = assign_labels(data, &centroids.view());

    debug!(
        method = %method.strategy(),
        k,
        n_samples = data.nrows(),
        "initialized centroids"
    );

    Ok(Initialization { centroids, labels })
}
