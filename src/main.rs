//! Metric Discovery CLI
//!
//! - `serve`: run the REST API
//! - `search`: glob search for one tenant
//! - `ingest`: index metric names for one tenant
//! - `config`: print a default configuration file
//!
//! Logging honours `RUST_LOG`, falling back to `logging.level`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use metric_discovery::api::{serve, ApiConfig, AppState};
use metric_discovery::config::{generate_default_config, Config, LoggingConfig};
use metric_discovery::discovery::{
    Annotations, DiscoveryDocument, DiscoveryIo, ExponentialBackoff, MetricDiscovery,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "metric-discovery")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tenant-scoped discovery of dotted metric names")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST API
    Serve {
        /// Use an in-process store instead of Elasticsearch
        #[arg(long)]
        memory: bool,
    },

    /// Search metric names
    Search {
        /// Tenant to search in
        #[arg(short, long)]
        tenant: String,
        /// Glob patterns; several patterns return their union
        #[arg(required = true)]
        patterns: Vec<String>,
        /// Show names one level below the (single) pattern instead
        #[arg(long)]
        next_level: bool,
    },

    /// Index metric names
    Ingest {
        /// Tenant owning the metrics
        #[arg(short, long)]
        tenant: String,
        /// Dotted metric names
        #[arg(required = true)]
        metrics: Vec<String>,
        /// Unit annotation for every metric
        #[arg(short, long)]
        unit: Option<String>,
        /// Data type annotation for every metric
        #[arg(long = "type")]
        data_type: Option<String>,
    },

    /// Print a default config file
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config = cli.command {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };

    init_logging(&config.logging)?;

    match cli.command {
        Commands::Serve { memory } => run_server(&config, memory).await,
        Commands::Search {
            tenant,
            patterns,
            next_level,
        } => run_search(&config, &tenant, &patterns, next_level).await,
        Commands::Ingest {
            tenant,
            metrics,
            unit,
            data_type,
        } => run_ingest(&config, &tenant, &metrics, unit, data_type).await,
        Commands::Config => Ok(()),
    }
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("invalid log level")?;
    let json = logging.format.eq_ignore_ascii_case("json");

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path))?;
            let writer = std::sync::Mutex::new(file);
            if json {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                    .init();
            }
        }
        None => {
            if json {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer().json())
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer())
                    .init();
            }
        }
    }

    Ok(())
}

fn build_discovery(config: &Config, memory: bool) -> anyhow::Result<MetricDiscovery> {
    let discovery = if memory {
        tracing::info!("Using in-memory backend");
        MetricDiscovery::in_memory(config)?
    } else {
        tracing::info!(url = %config.elasticsearch.url, "Using Elasticsearch backend");
        MetricDiscovery::from_config(config)?
    };

    Ok(discovery
        .with_deadline(Duration::from_secs(config.api.request_timeout_secs))
        .with_retry_policy(Arc::new(ExponentialBackoff::default())))
}

async fn run_server(config: &Config, memory: bool) -> anyhow::Result<()> {
    tracing::info!("Starting metric discovery v{}", env!("CARGO_PKG_VERSION"));

    let discovery = Arc::new(build_discovery(config, memory)?);
    match discovery.ping().await {
        Ok(()) => tracing::info!("Backend connection verified"),
        Err(e) => tracing::warn!("Backend not available: {} (readiness will fail)", e),
    }

    let targets = discovery.targets();
    tracing::info!(
        read_index = %targets.read_index(),
        write_index = %targets.write_index(),
        "Index targets"
    );

    let api_config = ApiConfig::from(&config.api);
    serve(AppState::new(discovery, api_config.clone()), &api_config).await?;

    tracing::info!("Metric discovery stopped");
    Ok(())
}

async fn run_search(
    config: &Config,
    tenant: &str,
    patterns: &[String],
    next_level: bool,
) -> anyhow::Result<()> {
    let discovery = build_discovery(config, false)?;

    let results = if next_level {
        anyhow::ensure!(patterns.len() == 1, "--next-level takes exactly one prefix");
        discovery.search_next_level(tenant, &patterns[0]).await?
    } else {
        discovery.search_batch(tenant, patterns).await?
    };

    for result in &results {
        match &result.unit {
            Some(unit) => println!("{} ({})", result.metric_name, unit),
            None => println!("{}", result.metric_name),
        }
    }
    if results.is_truncated() {
        eprintln!("{} metric(s), result cap reached", results.len());
    } else {
        eprintln!("{} metric(s)", results.len());
    }
    Ok(())
}

async fn run_ingest(
    config: &Config,
    tenant: &str,
    metrics: &[String],
    unit: Option<String>,
    data_type: Option<String>,
) -> anyhow::Result<()> {
    let discovery = build_discovery(config, false)?;
    let annotations = Annotations::for_metric(unit.as_deref(), data_type.as_deref());

    let documents = metrics
        .iter()
        .map(|metric| DiscoveryDocument::new(tenant, Some(metric.as_str()), annotations.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    let written = discovery.insert_discovery(documents).await?;
    println!("Indexed {} metric(s) for tenant {}", written, tenant);
    Ok(())
}
