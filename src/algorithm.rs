use crate::error::KMeansError;
use crate::geometry::{
    assign_labels, check_centroids, check_dataset, check_labels, compute_centroid_shift,
    compute_means, inertia,
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use tracing::{debug, info, warn};

/// Result of a single Lloyd iteration
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub centroids: Array2<f64>,
    pub labels: Array1<usize>,
    pub converged: bool,
}

/// Result of running Lloyd iterations until convergence or the cap
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub centroids: Array2<f64>,
    pub labels: Array1<usize>,
    /// `false` when the iteration cap was reached first
    pub converged: bool,
    /// Number of steps taken
    pub n_iterations: usize,
}

fn validate_state(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
    labels: &ArrayView1<usize>,
) -> Result<(), KMeansError> {
    check_dataset(data)?;
    check_centroids(centroids)?;
    check_labels(labels, data.nrows(), centroids.nrows())
}

/// Run one Lloyd iteration.
///
/// 1. Assign every point to its nearest centroid (ties go to the lowest index).
/// 2. Move each centroid to the mean of its points. A centroid with no
///    points keeps its position.
/// 3. If no centroid moved by `tol` or more, report convergence and return
///    the input centroids unchanged together with the assignment from step 1.
///
/// `labels` may be empty when no assignment exists yet. Inputs are never
/// modified.
pub fn step(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
    labels: &ArrayView1<usize>,
    tol: f64,
) -> Result<StepOutcome, KMeansError> {
    validate_state(data, centroids, labels)?;
    Ok(lloyd_step(data, centroids, labels, tol))
}

fn lloyd_step(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
    labels: &ArrayView1<usize>,
    tol: f64,
) -> StepOutcome {
    let new_labels = assign_labels(data, centroids);
    let (new_centroids, empty_clusters) = compute_means(data, &new_labels.view(), centroids);
    let shift = compute_centroid_shift(centroids, &new_centroids.view());

    let reassigned = if labels.is_empty() {
        new_labels.len()
    } else {
        labels
            .iter()
            .zip(new_labels.iter())
            .filter(|(a, b)| a != b)
            .count()
    };

    if !empty_clusters.is_empty() {
        debug!(?empty_clusters, "retaining centroids of empty clusters");
    }

    let converged = shift < tol;
    if converged {
        debug!(shift, "step converged");
        return StepOutcome {
            centroids: centroids.to_owned(),
            labels: new_labels,
            converged: true,
        };
    }

    debug!(
        shift,
        reassigned,
        inertia = inertia(data, &new_centroids.view(), &new_labels.view()),
        "step"
    );

    StepOutcome {
        centroids: new_centroids,
        labels: new_labels,
        converged: false,
    }
}

/// Repeat [`step`] until it converges or `max_iters` steps were taken.
///
/// Reaching the cap is not an error: the latest state is returned with
/// `converged == false`. With `max_iters == 0` the input centroids are
/// returned with labels from a fresh nearest-centroid assignment.
pub fn run_to_convergence(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
    labels: &ArrayView1<usize>,
    max_iters: usize,
    tol: f64,
) -> Result<RunOutcome, KMeansError> {
    validate_state(data, centroids, labels)?;

    let mut current_centroids = centroids.to_owned();
    let mut current_labels = if max_iters == 0 {
        assign_labels(data, centroids)
    } else {
        labels.to_owned()
    };

    for iteration in 0..max_iters {
        let outcome = lloyd_step(
            data,
            &current_centroids.view(),
            &current_labels.view(),
            tol,
        );
        current_centroids = outcome.centroids;
        current_labels = outcome.labels;

        if outcome.converged {
            info!(
                iterations = iteration + 1,
                inertia = inertia(data, &current_centroids.view(), &current_labels.view()),
                "converged"
            );
            return Ok(RunOutcome {
                centroids: current_centroids,
                labels: current_labels,
                converged: true,
                n_iterations: iteration + 1,
            });
        }
    }

    warn!(max_iters, "iteration cap reached before convergence");

    Ok(RunOutcome {
        centroids: current_centroids,
        labels: current_labels,
        converged: false,
        n_iterations: max_iters,
    })
}
