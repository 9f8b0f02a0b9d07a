//! JSON wire protocol.
//!
//! Request and response bodies for the four stateless operations, plus the
//! handlers that validate a decoded request and run it through a
//! [`KMeansEngine`]. Transport-agnostic: the HTTP server and tests both call
//! the `handle_*` functions directly.
//!
//! Every malformed payload is rejected here with
//! [`KMeansError::MalformedInput`] (or `InvalidK` for a non-positive cluster
//! count) before the engine sees it.

use crate::error::KMeansError;
use crate::geometry::{array_to_points, points_to_array, Point, MAX_COORDINATE};
use crate::init::{InitMethod, InitStrategy};
use crate::kmeans::KMeansEngine;
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Upper bound on a caller-requested iteration cap
pub const MAX_ITERATIONS_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GenerateParams {
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InitializeCentroidsRequest {
    pub method: String,
    pub data: Vec<Point>,
    #[serde(default)]
    pub number_of_centroids: Option<i64>,
    #[serde(default)]
    pub centroids: Option<Vec<Point>>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InitializeCentroidsResponse {
    pub centroids: Vec<Point>,
    pub labels: Vec<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StepRequest {
    pub data: Vec<Point>,
    pub centroids: Vec<Point>,
    #[serde(default)]
    pub labels: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StepResponse {
    pub centroids: Vec<Point>,
    pub labels: Vec<usize>,
    pub converged: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConvergeRequest {
    pub data: Vec<Point>,
    pub centroids: Vec<Point>,
    #[serde(default)]
    pub labels: Vec<i64>,
    #[serde(default)]
    pub max_iterations: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConvergeResponse {
    pub centroids: Vec<Point>,
    pub labels: Vec<usize>,
    pub converged: bool,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

impl From<&KMeansError> for ErrorResponse {
    fn from(err: &KMeansError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
        }
    }
}

/// Decode a JSON body, mapping any syntax or shape error to `MalformedInput`
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, KMeansError> {
    serde_json::from_slice(body).map_err(|e| KMeansError::MalformedInput(e.to_string()))
}

/// Per-request RNG: seeded when the caller asks for reproducibility,
/// otherwise drawn from OS entropy
pub fn request_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn to_array(points: &[Point], what: &str) -> Result<Array2<f64>, KMeansError> {
    if let Some((i, p)) = points.iter().enumerate().find(|(_, p)| !p.is_valid()) {
        return Err(KMeansError::MalformedInput(format!(
            "{} point {} must be finite with magnitude at most {:e}: ({}, {})",
            what, i, MAX_COORDINATE, p.x, p.y
        )));
    }
    Ok(points_to_array(points))
}

fn to_labels(labels: &[i64], k: usize) -> Result<Array1<usize>, KMeansError> {
    labels
        .iter()
        .enumerate()
        .map(|(i, &label)| {
            usize::try_from(label)
                .ok()
                .filter(|&l| l < k)
                .ok_or_else(|| {
                    KMeansError::MalformedInput(format!(
                        "label {} at index {} is out of range [0, {})",
                        label, i, k
                    ))
                })
        })
        .collect()
}

fn to_k(number_of_centroids: i64) -> Result<usize, KMeansError> {
    usize::try_from(number_of_centroids)
        .ok()
        .filter(|&k| k > 0)
        .ok_or_else(|| {
            KMeansError::InvalidK(format!(
                "number_of_centroids must be positive, got {}",
                number_of_centroids
            ))
        })
}

/// `GET /initialize-data`
pub fn handle_generate(
    engine: &KMeansEngine,
    params: &GenerateParams,
) -> Result<Vec<Point>, KMeansError> {
    let mut rng = request_rng(params.seed);
    let data = engine.generate(&mut rng)?;
    Ok(array_to_points(&data.view()))
}

/// `POST /initialize-centroids`
pub fn handle_initialize(
    engine: &KMeansEngine,
    req: InitializeCentroidsRequest,
) -> Result<InitializeCentroidsResponse, KMeansError> {
    let strategy: InitStrategy = req.method.parse()?;
    let data = to_array(&req.data, "data")?;

    let k = match (strategy, req.number_of_centroids, &req.centroids) {
        (_, Some(n), _) => to_k(n)?,
        (InitStrategy::Manual, None, Some(centroids)) => centroids.len(),
        (InitStrategy::Manual, None, None) => {
            return Err(KMeansError::MalformedInput(
                "manual initialization requires centroids".to_string(),
            ))
        }
        (_, None, _) => {
            return Err(KMeansError::MalformedInput(
                "number_of_centroids is required".to_string(),
            ))
        }
    };

    if let Some(centroids) = &req.centroids {
        to_array(centroids, "centroid")?;
    }
    let method = InitMethod::new(strategy, req.centroids)?;

    let mut rng = request_rng(req.seed);
    let init = engine.initialize(&method, &data.view(), k, &mut rng)?;

    Ok(InitializeCentroidsResponse {
        centroids: array_to_points(&init.centroids.view()),
        labels: init.labels.to_vec(),
    })
}

/// `POST /step-kmeans`
pub fn handle_step(engine: &KMeansEngine, req: StepRequest) -> Result<StepResponse, KMeansError> {
    let data = to_array(&req.data, "data")?;
    let centroids = to_array(&req.centroids, "centroid")?;
    let labels = to_labels(&req.labels, centroids.nrows())?;

    let outcome = engine.step(&data.view(), &centroids.view(), &labels.view())?;

    Ok(StepResponse {
        centroids: array_to_points(&outcome.centroids.view()),
        labels: outcome.labels.to_vec(),
        converged: outcome.converged,
    })
}

/// `POST /jump-to-convergence`
pub fn handle_converge(
    engine: &KMeansEngine,
    req: ConvergeRequest,
) -> Result<ConvergeResponse, KMeansError> {
    let data = to_array(&req.data, "data")?;
    let centroids = to_array(&req.centroids, "centroid")?;
    let labels = to_labels(&req.labels, centroids.nrows())?;
    let max_iters = match req.max_iterations {
        Some(n) if n > MAX_ITERATIONS_LIMIT => {
            return Err(KMeansError::MalformedInput(format!(
                "max_iterations must be at most {}, got {}",
                MAX_ITERATIONS_LIMIT, n
            )))
        }
        Some(n) => n,
        None => engine.config().max_iters,
    };

    let outcome =
        engine.run_to_convergence_capped(&data.view(), &centroids.view(), &labels.view(), max_iters)?;

    Ok(ConvergeResponse {
        centroids: array_to_points(&outcome.centroids.view()),
        labels: outcome.labels.to_vec(),
        converged: outcome.converged,
        iterations: outcome.n_iterations,
    })
}
