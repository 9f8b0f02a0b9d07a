use crate::error::KMeansError;

/// Distribution used by the dataset generator
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetShape {
    /// Points uniform in the bounding box
    Uniform,

    /// Gaussian blobs with centers uniform in the (shrunk) bounding box.
    /// Points are clamped to the box.
    Blobs {
        /// Number of blobs
        n_blobs: usize,
        /// Standard deviation of each blob along both axes
        spread: f64,
    },
}

/// Configuration for synthetic dataset generation
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    /// Number of points to generate
    pub n_samples: usize,

    /// Lower coordinate bound (both axes)
    pub low: f64,

    /// Upper coordinate bound (both axes)
    pub high: f64,

    /// Point distribution
    pub shape: DatasetShape,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            n_samples: 100,
            low: -10.0,
            high: 10.0,
            shape: DatasetShape::Blobs {
                n_blobs: 4,
                spread: 1.0,
            },
        }
    }
}

impl DatasetConfig {
    /// Uniform points in `[low, high]²`
    pub fn uniform(n_samples: usize, low: f64, high: f64) -> Self {
        Self {
            n_samples,
            low,
            high,
            shape: DatasetShape::Uniform,
        }
    }

    /// Gaussian blobs in the default `[-10, 10]²` box
    pub fn blobs(n_samples: usize, n_blobs: usize, spread: f64) -> Self {
        Self {
            n_samples,
            shape: DatasetShape::Blobs { n_blobs, spread },
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), KMeansError> {
        if self.n_samples == 0 {
            return Err(KMeansError::MalformedInput(
                "n_samples must be greater than 0".to_string(),
            ));
        }
        if !self.low.is_finite() || !self.high.is_finite() || self.low >= self.high {
            return Err(KMeansError::MalformedInput(format!(
                "invalid coordinate range [{}, {}]",
                self.low, self.high
            )));
        }
        if let DatasetShape::Blobs { n_blobs, spread } = self.shape {
            if n_blobs == 0 {
                return Err(KMeansError::MalformedInput(
                    "n_blobs must be greater than 0".to_string(),
                ));
            }
            if !spread.is_finite() || spread <= 0.0 {
                return Err(KMeansError::MalformedInput(format!(
                    "blob spread must be positive, got {}",
                    spread
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for the k-means engine
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    /// Convergence tolerance. A step converges when every centroid moved
    /// strictly less than this distance.
    pub tol: f64,

    /// Iteration cap for `run_to_convergence`
    pub max_iters: usize,

    /// Default random seed for generation and initialization
    pub seed: u64,

    /// Dataset generator settings
    pub dataset: DatasetConfig,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            tol: 1e-8,
            max_iters: 300,
            seed: 0,
            dataset: DatasetConfig::default(),
        }
    }
}

impl KMeansConfig {
    /// Set the maximum number of iterations
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the convergence tolerance
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the dataset generator settings
    pub fn with_dataset(mut self, dataset: DatasetConfig) -> Self {
        self.dataset = dataset;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dataset_is_valid() {
        assert!(DatasetConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_dataset_configs() {
        assert!(DatasetConfig::uniform(0, -1.0, 1.0).validate().is_err());
        assert!(DatasetConfig::uniform(10, 1.0, 1.0).validate().is_err());
        assert!(DatasetConfig::uniform(10, f64::NAN, 1.0).validate().is_err());
        assert!(DatasetConfig::blobs(10, 0, 1.0).validate().is_err());
        assert!(DatasetConfig::blobs(10, 3, -0.5).validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = KMeansConfig::default()
            .with_max_iters(10)
            .with_tol(1e-3)
            .with_seed(7);
        assert_eq!(config.max_iters, 10);
        assert_eq!(config.tol, 1e-3);
        assert_eq!(config.seed, 7);
    }
}
