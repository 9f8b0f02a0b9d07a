use crate::algorithm::{run_to_convergence, step, RunOutcome, StepOutcome};
use crate::config::KMeansConfig;
use crate::dataset;
use crate::error::KMeansError;
use crate::init::{initialize, InitMethod, Initialization};
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Stateless k-means engine.
///
/// The engine only carries configuration (tolerance, iteration cap, dataset
/// settings). All clustering state is passed in and returned by value, so one
/// engine can serve any number of independent runs from any thread.
///
/// # Example
///
/// ```
/// use kmeans_stepper::{InitMethod, KMeansEngine};
///
/// let engine = KMeansEngine::default();
/// let mut rng = engine.rng();
///
/// let data = engine.generate(&mut rng).unwrap();
/// let init = engine
///     .initialize(&InitMethod::KMeansPlusPlus, &data.view(), 4, &mut rng)
///     .unwrap();
///
/// let outcome = engine
///     .step(&data.view(), &init.centroids.view(), &init.labels.view())
///     .unwrap();
/// assert_eq!(outcome.centroids.nrows(), 4);
///
/// let done = engine
///     .run_to_convergence(&data.view(), &outcome.centroids.view(), &outcome.labels.view())
///     .unwrap();
/// assert!(done.converged);
/// ```
#[derive(Debug, Clone, Default)]
pub struct KMeansEngine {
    config: KMeansConfig,
}

impl KMeansEngine {
    /// Create an engine with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` unless the tolerance is finite and positive.
    pub fn with_config(config: KMeansConfig) -> Result<Self, KMeansError> {
        if !config.tol.is_finite() || config.tol <= 0.0 {
            return Err(KMeansError::MalformedInput(format!(
                "tolerance must be a finite positive number, got {}",
                config.tol
            )));
        }
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    /// A fresh RNG seeded from the configured seed
    pub fn rng(&self) -> ChaCha8Rng {
        crate::rng_from_seed(self.config.seed)
    }

    /// Generate a synthetic dataset from the configured settings.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Array2<f64>, KMeansError> {
        dataset::generate(&self.config.dataset, rng)
    }

    /// Seed `k` centroids and label every point.
    ///
    /// See [`crate::init::initialize`].
    pub fn initialize<R: Rng + ?Sized>(
        &self,
        method: &InitMethod,
        data: &ArrayView2<f64>,
        k: usize,
        rng: &mut R,
    ) -> Result<Initialization, KMeansError> {
        initialize(method, data, k, rng)
    }

    /// Run a single Lloyd iteration with the configured tolerance.
    pub fn step(
        &self,
        data: &ArrayView2<f64>,
        centroids: &ArrayView2<f64>,
        labels: &ArrayView1<usize>,
    ) -> Result<StepOutcome, KMeansError> {
        step(data, centroids, labels, self.config.tol)
    }

    /// Iterate until convergence or the configured cap.
    pub fn run_to_convergence(
        &self,
        data: &ArrayView2<f64>,
        centroids: &ArrayView2<f64>,
        labels: &ArrayView1<usize>,
    ) -> Result<RunOutcome, KMeansError> {
        self.run_to_convergence_capped(data, centroids, labels, self.config.max_iters)
    }

    /// Iterate until convergence or `max_iters`, overriding the configured cap.
    pub fn run_to_convergence_capped(
        &self,
        data: &ArrayView2<f64>,
        centroids: &ArrayView2<f64>,
        labels: &ArrayView1<usize>,
        max_iters: usize,
    ) -> Result<RunOutcome, KMeansError> {
        run_to_convergence(data, centroids, labels, max_iters, self.config.tol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;

    #[test]
    fn test_engine_rejects_bad_tolerance() {
        let config = KMeansConfig::default().with_tol(-1.0);
        assert!(matches!(
            KMeansEngine::with_config(config),
            Err(KMeansError::MalformedInput(_))
        ));

        let config = KMeansConfig::default().with_tol(f64::NAN);
        assert!(KMeansEngine::with_config(config).is_err());
    }

    #[test]
    fn test_engine_generate_uses_config() {
        let config = KMeansConfig::default().with_dataset(DatasetConfig::uniform(25, 0.0, 1.0));
        let engine = KMeansEngine::with_config(config).unwrap();

        let data = engine.generate(&mut engine.rng()).unwrap();
        assert_eq!(data.nrows(), 25);
    }

    #[test]
    fn test_engine_seeded_runs_are_reproducible() {
        let engine = KMeansEngine::with_config(KMeansConfig::default().with_seed(12345)).unwrap();

        let run = || {
            let mut rng = engine.rng();
            let data = engine.generate(&mut rng).unwrap();
            let init = engine
                .initialize(&InitMethod::FarthestFirst, &data.view(), 4, &mut rng)
                .unwrap();
            engine
                .run_to_convergence(&data.view(), &init.centroids.view(), &init.labels.view())
                .unwrap()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_engine_cap_override() {
        let engine = KMeansEngine::default();
        let mut rng = engine.rng();
        let data = engine.generate(&mut rng).unwrap();
        let init = engine
            .initialize(&InitMethod::Random, &data.view(), 3, &mut rng)
            .unwrap();

        let outcome = engine
            .run_to_convergence_capped(&data.view(), &init.centroids.view(), &init.labels.view(), 0)
            .unwrap();
        assert_eq!(outcome.n_iterations, 0);
        assert!(!outcome.converged);
    }
}
