//! Walk through k-means clustering from the terminal.
//!
//! Generates a dataset (or reads an `(n, 2)` f64 `.npy` file), seeds centroids
//! with the chosen method, then single-steps or runs to convergence while
//! printing the within-cluster sum of squares after every step.
//!
//! Usage: `kmeans-walk --method "Farthest First" --k 4 --steps 5`

use anyhow::{bail, Context};
use clap::Parser;
use kmeans_stepper::{
    DatasetConfig, InitStrategy, KMeansConfig, KMeansEngine, Phase, Point, Session,
};
use ndarray::Array2;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "kmeans-walk")]
#[command(about = "Step through k-means clustering on 2-D points")]
struct Args {
    /// Initialization method: Random, "Farthest First", KMeans++ or Manual
    #[arg(long, default_value = "KMeans++")]
    method: InitStrategy,

    /// Number of clusters
    #[arg(short, long, default_value_t = 3)]
    k: usize,

    /// Manual centroid as `x,y`; repeat once per cluster
    #[arg(long = "centroid", value_parser = parse_point)]
    centroids: Vec<Point>,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Read the dataset from an `(n, 2)` f64 .npy file instead of generating one
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long, default_value_t = 100)]
    n_samples: usize,

    #[arg(long, default_value_t = 4)]
    blobs: usize,

    #[arg(long, default_value_t = 1.0)]
    spread: f64,

    /// Generate uniform points instead of blobs
    #[arg(long)]
    uniform: bool,

    /// Take this many single steps instead of running to convergence
    #[arg(long)]
    steps: Option<usize>,

    #[arg(long, default_value_t = 300)]
    max_iters: usize,

    #[arg(long, default_value_t = 1e-8)]
    tol: f64,

    /// Write the final centroids to this .npy file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the final labels (u64) to this .npy file
    #[arg(long)]
    labels_output: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got '{}'", s))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x '{}': {}", x, e))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y '{}': {}", y, e))?;
    Ok(Point::new(x, y))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let dataset = if args.uniform {
        DatasetConfig::uniform(args.n_samples, -10.0, 10.0)
    } else {
        DatasetConfig::blobs(args.n_samples, args.blobs, args.spread)
    };
    let config = KMeansConfig::default()
        .with_seed(args.seed)
        .with_tol(args.tol)
        .with_max_iters(args.max_iters)
        .with_dataset(dataset);
    let engine = KMeansEngine::with_config(config)?;
    let mut rng = engine.rng();
    let mut session = Session::new(engine, args.k)?;

    match &args.input {
        Some(path) => {
            let reader = BufReader::new(
                File::open(path).with_context(|| format!("open {}", path.display()))?,
            );
            let data = Array2::<f64>::read_npy(reader)
                .with_context(|| format!("read {}", path.display()))?;
            session.load_dataset(data)?;
        }
        None => {
            session.generate(&mut rng)?;
        }
    }

    let n_samples = session.dataset().map_or(0, |d| d.nrows());
    info!(n_samples, k = args.k, method = %args.method, "dataset ready");

    if args.method == InitStrategy::Manual {
        if args.centroids.len() != args.k {
            bail!(
                "manual initialization needs exactly {} --centroid values, got {}",
                args.k,
                args.centroids.len()
            );
        }
        for point in &args.centroids {
            session.add_manual_centroid(*point)?;
        }
    }

    session.initialize(args.method, &mut rng)?;
    print_state("init", &session);

    match args.steps {
        Some(steps) => {
            for i in 1..=steps {
                let converged = session.step()?;
                print_state(&format!("step {}", i), &session);
                if converged {
                    break;
                }
            }
        }
        None => {
            let converged = session.run_to_convergence()?;
            if !converged {
                eprintln!(
                    "Stopped after {} iterations without converging",
                    args.max_iters
                );
            }
            print_state("final", &session);
        }
    }

    if session.phase() == Phase::Converged {
        println!("Converged.");
    }

    if let Some(path) = &args.output {
        let centroids = session
            .centroids()
            .context("no centroids after initialization")?;
        let writer = File::create(path).with_context(|| format!("create {}", path.display()))?;
        centroids.write_npy(writer)?;
        info!(path = %path.display(), "saved centroids");
    }

    if let Some(path) = &args.labels_output {
        let labels = session.labels().mapv(|l| l as u64);
        let writer = File::create(path).with_context(|| format!("create {}", path.display()))?;
        labels.write_npy(writer)?;
        info!(path = %path.display(), "saved labels");
    }

    Ok(())
}

fn print_state(tag: &str, session: &Session) {
    let inertia = session.inertia().unwrap_or(f64::NAN);
    println!("[{}] inertia = {:.6}", tag, inertia);
    if let Some(centroids) = session.centroids() {
        for (i, c) in centroids.outer_iter().enumerate() {
            let size = session.labels().iter().filter(|&&l| l == i).count();
            println!("  centroid {}: ({:.4}, {:.4})  {} points", i, c[0], c[1], size);
        }
    }
}
