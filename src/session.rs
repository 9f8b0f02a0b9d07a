//! Caller-side run state.
//!
//! The engine is stateless; a [`Session`] is what a front end keeps between
//! calls. It enforces the run lifecycle
//! `Empty -> DataGenerated -> CentroidsInitialized -> Converged` and collects
//! manual centroid picks one at a time until `k` of them are available.
//! A failed call leaves the session unchanged.

use crate::error::KMeansError;
use crate::geometry::{check_dataset, inertia, Point, MAX_COORDINATE};
use crate::init::{InitMethod, InitStrategy};
use crate::kmeans::KMeansEngine;
use ndarray::{Array1, Array2};
use rand::Rng;

/// Lifecycle phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    DataGenerated,
    CentroidsInitialized,
    Converged,
}

#[derive(Debug, Clone)]
pub struct Session {
    engine: KMeansEngine,
    k: usize,
    phase: Phase,
    dataset: Option<Array2<f64>>,
    centroids: Option<Array2<f64>>,
    labels: Array1<usize>,
    manual_picks: Vec<Point>,
}

impl Session {
    /// Create an empty session that will cluster into `k` groups.
    pub fn new(engine: KMeansEngine, k: usize) -> Result<Self, KMeansError> {
        check_session_k(k)?;
        Ok(Self {
            engine,
            k,
            phase: Phase::Empty,
            dataset: None,
            centroids: None,
            labels: Array1::zeros(0),
            manual_picks: Vec::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn dataset(&self) -> Option<&Array2<f64>> {
        self.dataset.as_ref()
    }

    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.centroids.as_ref()
    }

    /// Current labels; empty until centroids are initialized
    pub fn labels(&self) -> &Array1<usize> {
        &self.labels
    }

    pub fn manual_picks(&self) -> &[Point] {
        &self.manual_picks
    }

    /// Within-cluster sum of squares of the current state
    pub fn inertia(&self) -> Option<f64> {
        match (&self.dataset, &self.centroids) {
            (Some(data), Some(centroids)) if !self.labels.is_empty() => {
                Some(inertia(&data.view(), &centroids.view(), &self.labels.view()))
            }
            _ => None,
        }
    }

    /// Change the cluster count. Discards centroids, labels and manual picks.
    pub fn set_k(&mut self, k: usize) -> Result<(), KMeansError> {
        check_session_k(k)?;
        self.k = k;
        self.reset(true);
        Ok(())
    }

    /// Replace the dataset with freshly generated points.
    pub fn generate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&Array2<f64>, KMeansError> {
        let data = self.engine.generate(rng)?;
        Ok(self.install_dataset(data))
    }

    /// Replace the dataset with caller-supplied points.
    pub fn load_dataset(&mut self, data: Array2<f64>) -> Result<&Array2<f64>, KMeansError> {
        check_dataset(&data.view())?;
        Ok(self.install_dataset(data))
    }

    fn install_dataset(&mut self, data: Array2<f64>) -> &Array2<f64> {
        self.clear_run();
        self.phase = Phase::DataGenerated;
        self.dataset.insert(data)
    }

    /// Record one manual centroid pick. Returns how many picks are still
    /// needed before manual initialization can run.
    pub fn add_manual_centroid(&mut self, point: Point) -> Result<usize, KMeansError> {
        match self.phase {
            Phase::Empty => return Err(KMeansError::NotInitialized("no dataset has been generated")),
            Phase::CentroidsInitialized | Phase::Converged => {
                return Err(KMeansError::AlreadyInitialized(
                    "centroids are already initialized; reset before picking",
                ))
            }
            Phase::DataGenerated => {}
        }
        if !point.is_valid() {
            return Err(KMeansError::MalformedInput(format!(
                "manual centroid must be finite with magnitude at most {:e}, got ({}, {})",
                MAX_COORDINATE, point.x, point.y
            )));
        }
        if self.manual_picks.len() >= self.k {
            return Err(KMeansError::CentroidCountMismatch {
                expected: self.k,
                got: self.manual_picks.len() + 1,
            });
        }

        self.manual_picks.push(point);
        Ok(self.k - self.manual_picks.len())
    }

    /// Seed centroids with `strategy`. Manual initialization uses the
    /// accumulated picks and fails unless exactly `k` were made.
    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        strategy: InitStrategy,
        rng: &mut R,
    ) -> Result<(), KMeansError> {
        let data = self
            .dataset
            .as_ref()
            .ok_or(KMeansError::NotInitialized("no dataset has been generated"))?;

        let method = match strategy {
            InitStrategy::Manual => {
                if self.manual_picks.len() != self.k {
                    return Err(KMeansError::CentroidCountMismatch {
                        expected: self.k,
                        got: self.manual_picks.len(),
                    });
                }
                InitMethod::Manual(self.manual_picks.clone())
            }
            other => InitMethod::new(other, None)?,
        };

        let init = self.engine.initialize(&method, &data.view(), self.k, rng)?;

        self.centroids = Some(init.centroids);
        self.labels = init.labels;
        self.manual_picks.clear();
        self.phase = Phase::CentroidsInitialized;
        Ok(())
    }

    /// Advance one Lloyd iteration. Returns whether the run has converged;
    /// once converged, further calls change nothing.
    pub fn step(&mut self) -> Result<bool, KMeansError> {
        if self.phase == Phase::Converged {
            return Ok(true);
        }
        let (data, centroids) = self.initialized_state()?;

        let outcome = self
            .engine
            .step(&data.view(), &centroids.view(), &self.labels.view())?;

        self.centroids = Some(outcome.centroids);
        self.labels = outcome.labels;
        if outcome.converged {
            self.phase = Phase::Converged;
        }
        Ok(outcome.converged)
    }

    /// Iterate until convergence or the engine's iteration cap. Returns
    /// whether convergence was reached.
    pub fn run_to_convergence(&mut self) -> Result<bool, KMeansError> {
        if self.phase == Phase::Converged {
            return Ok(true);
        }
        let (data, centroids) = self.initialized_state()?;

        let outcome =
            self.engine
                .run_to_convergence(&data.view(), &centroids.view(), &self.labels.view())?;

        self.centroids = Some(outcome.centroids);
        self.labels = outcome.labels;
        if outcome.converged {
            self.phase = Phase::Converged;
        }
        Ok(outcome.converged)
    }

    /// Drop centroids, labels and manual picks. With `keep_data` the session
    /// returns to `DataGenerated`, otherwise to `Empty`.
    pub fn reset(&mut self, keep_data: bool) {
        self.clear_run();
        if !keep_data {
            self.dataset = None;
        }
        self.phase = if self.dataset.is_some() {
            Phase::DataGenerated
        } else {
            Phase::Empty
        };
    }

    fn clear_run(&mut self) {
        self.centroids = None;
        self.labels = Array1::zeros(0);
        self.manual_picks.clear();
    }

    fn initialized_state(&self) -> Result<(&Array2<f64>, &Array2<f64>), KMeansError> {
        match (&self.dataset, &self.centroids) {
            (Some(data), Some(centroids)) => Ok((data, centroids)),
            (None, _) => Err(KMeansError::NotInitialized("no dataset has been generated")),
            (Some(_), None) => Err(KMeansError::NotInitialized(
                "centroids have not been initialized",
            )),
        }
    }
}

fn check_session_k(k: usize) -> Result<(), KMeansError> {
    if k == 0 {
        return Err(KMeansError::InvalidK(
            "k must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng_from_seed;
    use ndarray::array;

    fn session(k: usize) -> Session {
        Session::new(KMeansEngine::default(), k).unwrap()
    }

    #[test]
    fn test_lifecycle() {
        let mut rng = rng_from_seed(21);
        let mut s = session(3);
        assert_eq!(s.phase(), Phase::Empty);

        s.generate(&mut rng).unwrap();
        assert_eq!(s.phase(), Phase::DataGenerated);
        assert!(s.labels().is_empty());

        s.initialize(InitStrategy::KMeansPlusPlus, &mut rng).unwrap();
        assert_eq!(s.phase(), Phase::CentroidsInitialized);
        assert_eq!(s.labels().len(), 100);

        let before = s.inertia().unwrap();
        let converged = s.step().unwrap();
        assert!(s.inertia().unwrap() <= before + 1e-9);

        if !converged {
            assert!(s.run_to_convergence().unwrap());
        }
        assert_eq!(s.phase(), Phase::Converged);

        // Converged sessions stay put
        let centroids = s.centroids().cloned();
        assert!(s.step().unwrap());
        assert_eq!(s.centroids().cloned(), centroids);
    }

    #[test]
    fn test_operations_require_prerequisites() {
        let mut rng = rng_from_seed(0);
        let mut s = session(2);

        assert!(matches!(
            s.initialize(InitStrategy::Random, &mut rng),
            Err(KMeansError::NotInitialized(_))
        ));
        assert!(matches!(s.step(), Err(KMeansError::NotInitialized(_))));
        assert!(matches!(
            s.add_manual_centroid(Point::new(0.0, 0.0)),
            Err(KMeansError::NotInitialized(_))
        ));

        s.generate(&mut rng).unwrap();
        assert!(matches!(
            s.run_to_convergence(),
            Err(KMeansError::NotInitialized(_))
        ));
        assert_eq!(s.phase(), Phase::DataGenerated);
    }

    #[test]
    fn test_manual_picks_accumulate_until_k() {
        let mut rng = rng_from_seed(0);
        let mut s = session(2);
        s.load_dataset(array![[0.0, 0.0], [0.0, 1.0], [10.0, 10.0], [10.0, 11.0]])
            .unwrap();

        assert_eq!(s.add_manual_centroid(Point::new(1.0, 1.0)).unwrap(), 1);

        // One pick short: rejected, nothing padded, state untouched
        assert_eq!(
            s.initialize(InitStrategy::Manual, &mut rng),
            Err(KMeansError::CentroidCountMismatch { expected: 2, got: 1 })
        );
        assert_eq!(s.phase(), Phase::DataGenerated);
        assert!(s.centroids().is_none());
        assert_eq!(s.manual_picks().len(), 1);

        assert_eq!(s.add_manual_centroid(Point::new(9.0, 9.0)).unwrap(), 0);
        assert!(matches!(
            s.add_manual_centroid(Point::new(5.0, 5.0)),
            Err(KMeansError::CentroidCountMismatch { expected: 2, got: 3 })
        ));

        s.initialize(InitStrategy::Manual, &mut rng).unwrap();
        assert_eq!(s.centroids().unwrap(), &array![[1.0, 1.0], [9.0, 9.0]]);
        assert_eq!(s.labels(), &array![0usize, 0, 1, 1]);
        assert!(s.manual_picks().is_empty());
    }

    #[test]
    fn test_manual_pick_after_initialization_is_a_phase_error() {
        let mut rng = rng_from_seed(3);
        let mut s = session(2);
        s.generate(&mut rng).unwrap();
        s.initialize(InitStrategy::KMeansPlusPlus, &mut rng).unwrap();

        let err = s.add_manual_centroid(Point::new(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, KMeansError::AlreadyInitialized(_)));
        assert_eq!(err.kind(), "already_initialized");

        s.run_to_convergence().unwrap();
        assert!(matches!(
            s.add_manual_centroid(Point::new(0.0, 0.0)),
            Err(KMeansError::AlreadyInitialized(_))
        ));

        s.reset(true);
        assert_eq!(s.add_manual_centroid(Point::new(0.0, 0.0)).unwrap(), 1);
    }

    #[test]
    fn test_manual_pick_rejects_out_of_range_coordinates() {
        let mut s = session(1);
        s.load_dataset(array![[0.0, 0.0]]).unwrap();

        assert!(matches!(
            s.add_manual_centroid(Point::new(1.5e160, 0.0)),
            Err(KMeansError::MalformedInput(_))
        ));
        assert!(matches!(
            s.add_manual_centroid(Point::new(f64::NAN, 0.0)),
            Err(KMeansError::MalformedInput(_))
        ));
        assert!(s.manual_picks().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut rng = rng_from_seed(4);
        let mut s = session(2);
        s.generate(&mut rng).unwrap();
        s.initialize(InitStrategy::Random, &mut rng).unwrap();

        s.reset(true);
        assert_eq!(s.phase(), Phase::DataGenerated);
        assert!(s.dataset().is_some());
        assert!(s.centroids().is_none());
        assert!(s.labels().is_empty());

        s.reset(false);
        assert_eq!(s.phase(), Phase::Empty);
        assert!(s.dataset().is_none());
    }

    #[test]
    fn test_set_k() {
        let mut rng = rng_from_seed(4);
        let mut s = session(2);
        s.generate(&mut rng).unwrap();
        s.initialize(InitStrategy::FarthestFirst, &mut rng).unwrap();

        assert!(matches!(s.set_k(0), Err(KMeansError::InvalidK(_))));
        assert_eq!(s.phase(), Phase::CentroidsInitialized);

        s.set_k(5).unwrap();
        assert_eq!(s.phase(), Phase::DataGenerated);
        s.initialize(InitStrategy::Random, &mut rng).unwrap();
        assert_eq!(s.centroids().unwrap().nrows(), 5);
    }

    #[test]
    fn test_load_rejects_empty_dataset() {
        let mut s = session(1);
        assert_eq!(
            s.load_dataset(Array2::zeros((0, 2))).map(|_| ()),
            Err(KMeansError::EmptyDataset)
        );
        assert_eq!(s.phase(), Phase::Empty);
    }
}
