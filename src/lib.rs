//! # kmeans-stepper
//!
//! A step-by-step k-means clustering engine for 2-D points, built on ndarray.
//!
//! ## Features
//!
//! - **Stateless engine**: every operation takes the full clustering state
//!   (dataset, centroids, labels) and returns a new one, so callers own all
//!   state between calls
//! - **Four initialization strategies**: Random, Farthest-First, KMeans++ and
//!   Manual, behind the [`CentroidSeeder`] trait
//! - **Single steps or jump to convergence**: one Lloyd iteration at a time,
//!   or iterate until centroids stop moving (bounded by an iteration cap)
//! - **Reproducible randomness**: randomized strategies draw from a
//!   caller-supplied RNG, see [`rng_from_seed`]
//! - **JSON protocol and HTTP server**: the `protocol` module validates wire
//!   payloads; the `server` feature serves them with axum
//!
//! ## Example
//!
//! ```rust
//! use kmeans_stepper::{rng_from_seed, DatasetConfig, InitMethod, KMeansConfig, KMeansEngine};
//!
//! let config = KMeansConfig::default()
//!     .with_dataset(DatasetConfig::blobs(200, 3, 0.8))
//!     .with_max_iters(100);
//! let engine = KMeansEngine::with_config(config).unwrap();
//! let mut rng = rng_from_seed(42);
//!
//! let data = engine.generate(&mut rng).unwrap();
//! let init = engine
//!     .initialize(&InitMethod::FarthestFirst, &data.view(), 3, &mut rng)
//!     .unwrap();
//!
//! // Step once...
//! let stepped = engine
//!     .step(&data.view(), &init.centroids.view(), &init.labels.view())
//!     .unwrap();
//!
//! // ...or run to convergence
//! let done = engine
//!     .run_to_convergence(&data.view(), &stepped.centroids.view(), &stepped.labels.view())
//!     .unwrap();
//! assert_eq!(done.labels.len(), 200);
//! ```
//!
//! ## Manual initialization
//!
//! ```rust
//! use kmeans_stepper::{rng_from_seed, InitStrategy, KMeansEngine, Point, Session};
//! use ndarray::array;
//!
//! let mut session = Session::new(KMeansEngine::default(), 2).unwrap();
//! session
//!     .load_dataset(array![[0.0, 0.0], [0.0, 1.0], [10.0, 10.0], [10.0, 11.0]])
//!     .unwrap();
//!
//! session.add_manual_centroid(Point::new(1.0, 1.0)).unwrap();
//! session.add_manual_centroid(Point::new(9.0, 9.0)).unwrap();
//! session.initialize(InitStrategy::Manual, &mut rng_from_seed(0)).unwrap();
//!
//! assert!(session.run_to_convergence().unwrap());
//! ```

mod algorithm;
mod config;
mod dataset;
mod error;
mod geometry;
mod init;
mod kmeans;
pub mod protocol;
#[cfg(feature = "server")]
pub mod server;
mod session;

pub use algorithm::{run_to_convergence, step, RunOutcome, StepOutcome};
pub use config::{DatasetConfig, DatasetShape, KMeansConfig};
pub use dataset::generate;
pub use error::KMeansError;
pub use geometry::{
    array_to_points, assign_labels, euclidean_distance, inertia, is_valid_coordinate,
    points_to_array, Point, MAX_COORDINATE,
};
pub use init::{
    initialize, CentroidSeeder, FarthestFirstSeeder, InitMethod, InitStrategy, Initialization,
    KMeansPlusPlusSeeder, ManualSeeder, RandomSeeder,
};
pub use kmeans::KMeansEngine;
pub use session::{Phase, Session};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Build the crate's reproducible RNG from a seed
pub fn rng_from_seed(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}
