use crate::config::{DatasetConfig, DatasetShape};
use crate::error::KMeansError;
use ndarray::Array2;
use ndarray_rand::rand_distr::{Distribution, Normal, Uniform};
use ndarray_rand::RandomExt;
use rand::Rng;
use tracing::debug;

/// Generate a synthetic `(n_samples, 2)` dataset.
///
/// The output depends only on `config` and the state of `rng`, so a seeded
/// generator reproduces the same points. Every coordinate lies in
/// `[config.low, config.high]`.
pub fn generate<R: Rng + ?Sized>(
    config: &DatasetConfig,
    rng: &mut R,
) -> Result<Array2<f64>, KMeansError> {
    config.validate()?;

    let data = match config.shape {
        DatasetShape::Uniform => Array2::random_using(
            (config.n_samples, 2),
            Uniform::new_inclusive(config.low, config.high),
            rng,
        ),
        DatasetShape::Blobs { n_blobs, spread } => generate_blobs(config, n_blobs, spread, rng)?,
    };

    debug!(
        n_samples = config.n_samples,
        shape = ?config.shape,
        "generated dataset"
    );

    Ok(data)
}

fn generate_blobs<R: Rng + ?Sized>(
    config: &DatasetConfig,
    n_blobs: usize,
    spread: f64,
    rng: &mut R,
) -> Result<Array2<f64>, KMeansError> {
    // Keep centers three deviations away from the border when the box allows it
    let margin = 3.0 * spread;
    let (center_low, center_high) = if config.low + margin < config.high - margin {
        (config.low + margin, config.high - margin)
    } else {
        (config.low, config.high)
    };

    let centers = Array2::random_using(
        (n_blobs, 2),
        Uniform::new_inclusive(center_low, center_high),
        rng,
    );
    let noise = Normal::new(0.0, spread)
        .map_err(|e| KMeansError::MalformedInput(format!("invalid blob spread: {}", e)))?;

    let mut data = Array2::zeros((config.n_samples, 2));
    for i in 0..config.n_samples {
        let center = centers.row(i % n_blobs);
        for j in 0..2 {
            let value = center[j] + noise.sample(rng);
            data[[i, j]] = value.clamp(config.low, config.high);
        }
    }

    Ok(data)
}
