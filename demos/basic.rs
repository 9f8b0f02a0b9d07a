//! Basic example stepping through k-means one iteration at a time
//!
//! Run with: cargo run --example basic --release

use kmeans_stepper::{inertia, DatasetConfig, InitMethod, KMeansConfig, KMeansEngine};

fn main() {
    println!("=== kmeans-stepper example ===\n");

    let n_samples = 300;
    let n_clusters = 3;

    let config = KMeansConfig::default()
        .with_seed(42)
        .with_dataset(DatasetConfig::blobs(n_samples, n_clusters, 1.0));
    let engine = KMeansEngine::with_config(config).expect("valid configuration");
    let mut rng = engine.rng();

    println!("Generating {} samples in {} blobs...", n_samples, n_clusters);
    let data = engine.generate(&mut rng).expect("generation failed");

    let init = engine
        .initialize(&InitMethod::KMeansPlusPlus, &data.view(), n_clusters, &mut rng)
        .expect("initialization failed");

    println!("Initial centroids (KMeans++):");
    for (i, c) in init.centroids.outer_iter().enumerate() {
        println!("  Centroid {}: ({:.2}, {:.2})", i, c[0], c[1]);
    }
    println!();

    let mut centroids = init.centroids;
    let mut labels = init.labels;

    for iteration in 1..=engine.config().max_iters {
        let outcome = engine
            .step(&data.view(), &centroids.view(), &labels.view())
            .expect("step failed");
        centroids = outcome.centroids;
        labels = outcome.labels;

        println!(
            "Step {}: inertia = {:.4}",
            iteration,
            inertia(&data.view(), &centroids.view(), &labels.view())
        );
        if outcome.converged {
            println!("Converged after {} steps\n", iteration);
            break;
        }
    }

    println!("Final centroids:");
    for (i, c) in centroids.outer_iter().enumerate() {
        let count = labels.iter().filter(|&&l| l == i).count();
        println!(
            "  Centroid {}: ({:.4}, {:.4})  {} samples ({:.1}%)",
            i,
            c[0],
            c[1],
            count,
            (count as f64 / n_samples as f64) * 100.0
        );
    }

    println!("\n=== Done! ===");
}
