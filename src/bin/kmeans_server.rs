//! HTTP server for step-by-step k-means.
//!
//! Usage: `kmeans-server --listen 127.0.0.1:5000`

use anyhow::Context;
use clap::Parser;
use kmeans_stepper::server::router;
use kmeans_stepper::{DatasetConfig, KMeansConfig, KMeansEngine};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "kmeans-server")]
#[command(about = "Stateless HTTP API for stepping through k-means clustering")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:5000")]
    listen: String,

    /// Points per generated dataset
    #[arg(long, default_value_t = 100)]
    n_samples: usize,

    #[arg(long, default_value_t = 4)]
    blobs: usize,

    #[arg(long, default_value_t = 1.0)]
    spread: f64,

    /// Generate uniform points instead of blobs
    #[arg(long)]
    uniform: bool,

    /// Default cap for /jump-to-convergence
    #[arg(long, default_value_t = 300)]
    max_iters: usize,

    #[arg(long, default_value_t = 1e-8)]
    tol: f64,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let dataset = if args.uniform {
        DatasetConfig::uniform(args.n_samples, -10.0, 10.0)
    } else {
        DatasetConfig::blobs(args.n_samples, args.blobs, args.spread)
    };
    let config = KMeansConfig::default()
        .with_tol(args.tol)
        .with_max_iters(args.max_iters)
        .with_dataset(dataset);
    let engine = KMeansEngine::with_config(config).context("invalid engine configuration")?;

    let app = router(engine);
    let listener = tokio::net::TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("bind {}", args.listen))?;

    info!(
        listen = %args.listen,
        n_samples = args.n_samples,
        max_iters = args.max_iters,
        "kmeans-server started"
    );

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            if let Err(err) = result {
                error!("server error: {err}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }

    Ok(())
}
