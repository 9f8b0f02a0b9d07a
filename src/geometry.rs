use crate::error::KMeansError;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Largest accepted coordinate magnitude.
///
/// Keeps squared distances and per-cluster sums far from `f64` overflow for
/// any realistic number of points.
pub const MAX_COORDINATE: f64 = 1e100;

/// Finite and within `[-MAX_COORDINATE, MAX_COORDINATE]`
#[inline]
pub fn is_valid_coordinate(v: f64) -> bool {
    v.is_finite() && v.abs() <= MAX_COORDINATE
}

/// A point in the plane.
///
/// Serialized as a two-element array `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates pass [`is_valid_coordinate`]
    pub fn is_valid(&self) -> bool {
        is_valid_coordinate(self.x) && is_valid_coordinate(self.y)
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Stack points into an `(n, 2)` array
pub fn points_to_array(points: &[Point]) -> Array2<f64> {
    let mut out = Array2::zeros((points.len(), 2));
    for (i, p) in points.iter().enumerate() {
        out[[i, 0]] = p.x;
        out[[i, 1]] = p.y;
    }
    out
}

/// Split an `(n, 2)` array into points
pub fn array_to_points(data: &ArrayView2<f64>) -> Vec<Point> {
    data.outer_iter()
        .map(|row| Point::new(row[0], row[1]))
        .collect()
}

/// Squared Euclidean distance between two rows
#[inline]
pub fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Euclidean distance between two rows
#[inline]
pub fn euclidean_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Index of and squared distance to the nearest centroid.
///
/// Ties go to the lowest centroid index. `centroids` must be non-empty.
pub fn nearest_centroid(point: &ArrayView1<f64>, centroids: &ArrayView2<f64>) -> (usize, f64) {
    let mut best_label = 0;
    let mut best_dist = f64::INFINITY;

    for (j, centroid) in centroids.outer_iter().enumerate() {
        let dist = squared_distance(point, &centroid);
        // Strict comparison keeps the first centroid on ties
        if dist < best_dist {
            best_dist = dist;
            best_label = j;
        }
    }

    (best_label, best_dist)
}

/// Assign every point to its nearest centroid
pub fn assign_labels(data: &ArrayView2<f64>, centroids: &ArrayView2<f64>) -> Array1<usize> {
    data.outer_iter()
        .map(|row| nearest_centroid(&row, centroids).0)
        .collect()
}

/// Recompute each centroid as the mean of its assigned points.
///
/// Clusters that received no points keep their previous coordinates; their
/// indices are returned alongside the new centroids.
pub fn compute_means(
    data: &ArrayView2<f64>,
    labels: &ArrayView1<usize>,
    prev_centroids: &ArrayView2<f64>,
) -> (Array2<f64>, Vec<usize>) {
    let k = prev_centroids.nrows();
    let n_features = data.ncols();

    let mut cluster_sums: Array2<f64> = Array2::zeros((k, n_features));
    let mut cluster_counts = vec![0usize; k];

    for (row, &label) in data.outer_iter().zip(labels.iter()) {
        cluster_counts[label] += 1;
        for j in 0..n_features {
            cluster_sums[[label, j]] += row[j];
        }
    }

    let mut centroids = prev_centroids.to_owned();
    let mut empty_clusters = Vec::new();

    for (cluster_idx, &count) in cluster_counts.iter().enumerate() {
        if count > 0 {
            for j in 0..n_features {
                centroids[[cluster_idx, j]] = cluster_sums[[cluster_idx, j]] / count as f64;
            }
        } else {
            empty_clusters.push(cluster_idx);
        }
    }

    (centroids, empty_clusters)
}

/// Largest Euclidean movement of any single centroid
pub fn compute_centroid_shift(
    old_centroids: &ArrayView2<f64>,
    new_centroids: &ArrayView2<f64>,
) -> f64 {
    old_centroids
        .outer_iter()
        .zip(new_centroids.outer_iter())
        .map(|(old_c, new_c)| euclidean_distance(&old_c, &new_c))
        .fold(0.0, f64::max)
}

/// Within-cluster sum of squared distances
pub fn inertia(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
    labels: &ArrayView1<usize>,
) -> f64 {
    data.outer_iter()
        .zip(labels.iter())
        .map(|(row, &label)| squared_distance(&row, &centroids.row(label)))
        .sum()
}

/// Validate a dataset: non-empty, two columns, coordinates in range
pub(crate) fn check_dataset(data: &ArrayView2<f64>) -> Result<(), KMeansError> {
    if data.nrows() == 0 {
        return Err(KMeansError::EmptyDataset);
    }
    check_points(data, "dataset")
}

/// Validate a centroid set: non-empty, two columns, coordinates in range
pub(crate) fn check_centroids(centroids: &ArrayView2<f64>) -> Result<(), KMeansError> {
    if centroids.nrows() == 0 {
        return Err(KMeansError::InvalidK(
            "centroid set must contain at least one centroid".to_string(),
        ));
    }
    check_points(centroids, "centroids")
}

/// Validate labels against a dataset of `n` points and `k` centroids.
/// Empty labels mean "not yet assigned" and are accepted.
pub(crate) fn check_labels(labels: &ArrayView1<usize>, n: usize, k: usize) -> Result<(), KMeansError> {
    if labels.is_empty() {
        return Ok(());
    }
    if labels.len() != n {
        return Err(KMeansError::MalformedInput(format!(
            "expected {} labels, got {}",
            n,
            labels.len()
        )));
    }
    if let Some((i, &label)) = labels.iter().enumerate().find(|(_, &l)| l >= k) {
        return Err(KMeansError::MalformedInput(format!(
            "label {} at index {} is out of range for {} centroids",
            label, i, k
        )));
    }
    Ok(())
}

fn check_points(points: &ArrayView2<f64>, what: &str) -> Result<(), KMeansError> {
    if points.ncols() != 2 {
        return Err(KMeansError::MalformedInput(format!(
            "{} must have 2 coordinates per point, got {}",
            what,
            points.ncols()
        )));
    }
    if let Some(&v) = points.iter().find(|&&v| !is_valid_coordinate(v)) {
        return Err(KMeansError::MalformedInput(format!(
            "{} contains a coordinate that is non-finite or exceeds {:e} in magnitude ({})",
            what, MAX_COORDINATE, v
        )));
    }
    Ok(())
}
