//! Frontier Worker main entry point
//!
//! Connects the configured frontier backend to the Kafka topics and runs the
//! worker loop until interrupted.

use clap::Parser;
use frontier_worker::backend::open_backend;
use frontier_worker::bus::kafka::{KafkaSink, KafkaSource};
use frontier_worker::config::{load_config_with_hash, Config};
use frontier_worker::worker::{ExclusionPolicy, FrontierWorker};
use frontier_worker::WorkerError;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Frontier Worker: feeds a crawl frontier from a message bus
///
/// Consumes crawl results (seeds, crawled pages, request errors) from the
/// incoming topic, applies them to the frontier backend, and publishes new
/// request batches to the outgoing topic, partitioned by domain.
#[derive(Parser, Debug)]
#[command(name = "frontier-worker")]
#[command(version = "1.0.0")]
#[command(about = "Crawl frontier worker", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: PathBuf,

    /// Only ingest results; never publish new batches
    #[arg(long)]
    no_batches: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            let e = WorkerError::Config(e);
            tracing::error!("{}", e);
            return Err(e.into());
        }
    };

    if cli.no_batches {
        config.worker.disable_new_batches = true;
    }

    match run_worker(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Worker failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("frontier_worker=info,warn"),
            1 => EnvFilter::new("frontier_worker=debug,info"),
            2 => EnvFilter::new("frontier_worker=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the worker from the configuration and runs it until Ctrl-C
async fn run_worker(config: Config) -> frontier_worker::Result<()> {
    tracing::info!(
        "Backend: {:?}, exclusions: {}",
        config.backend.kind,
        config.exclude.len()
    );
    let backend = open_backend(&config.backend)?;

    let source = KafkaSource::new(&config.kafka)?;
    let sink = KafkaSink::new(&config.kafka)?;

    let mut worker = FrontierWorker::new(&config.worker, backend, source, sink)
        .with_link_filter(ExclusionPolicy::from_config(&config.exclude));

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for interrupt: {}", e);
            return;
        }
        tracing::info!("Interrupt received, shutting down");
        signal_token.cancel();
    });

    worker.run(shutdown).await
}
