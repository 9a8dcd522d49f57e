//! Index Health Exporter entry point
//!
//! # Usage
//!
//! ```bash
//! # Serve /metrics for Prometheus
//! index-health serve --es-uri http://localhost:9200 --listen 0.0.0.0:9114
//!
//! # Poll once and print the health records
//! index-health once --es-uri http://localhost:9200 --block-matching exact
//! ```

use clap::{Args, Parser, Subcommand};
use index_health::handler::{create_router, AppState};
use index_health::telemetry::init_tracing;
use index_health::{ExporterConfig, IndexHealthCollector, LogFormat};
use index_health_core::BlockMatching;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "index-health")]
#[command(about = "Index Health Exporter - per-index cluster health as Prometheus metrics")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    exporter: ExporterArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ExporterArgs {
    /// Path to a YAML or JSON config file
    #[arg(short, long, global = true, env = "INDEX_HEALTH_CONFIG")]
    config: Option<PathBuf>,

    /// Cluster base URI
    #[arg(long, global = true, env = "ES_URI")]
    es_uri: Option<String>,

    /// Cluster state fetch timeout in milliseconds
    #[arg(long, global = true, env = "ES_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Metric namespace
    #[arg(long, global = true, env = "METRICS_NAMESPACE")]
    namespace: Option<String>,

    /// Block level matching: substring or exact
    #[arg(long, global = true, env = "BLOCK_MATCHING")]
    block_matching: Option<BlockMatching>,

    /// Log format: json or pretty
    #[arg(long, global = true, env = "LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

impl ExporterArgs {
    /// Defaults, then the config file, then flags and environment
    fn resolve(&self) -> anyhow::Result<ExporterConfig> {
        let mut config = match &self.config {
            Some(path) => ExporterConfig::from_file(path)?,
            None => ExporterConfig::default(),
        };

        if let Some(uri) = &self.es_uri {
            config.es_uri = uri.clone();
        }
        if let Some(timeout) = self.timeout_ms {
            config.timeout_ms = timeout;
        }
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(matching) = self.block_matching {
            config.block_matching = matching;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the metrics server
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "LISTEN_ADDRESS")]
        listen: Option<String>,
    },

    /// Poll the cluster once and print the health records as JSON
    Once,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = cli.exporter.resolve()?;

    init_tracing(config.log_format);

    match cli.command {
        Commands::Serve { listen } => {
            if let Some(listen) = listen {
                config.listen_address = listen;
            }
            let addr: SocketAddr = config.listen_address.parse()?;

            let collector = IndexHealthCollector::from_config(&config)?;
            let router = create_router(Arc::new(AppState::new(collector)));

            tracing::info!(
                es_uri = %config.es_uri,
                namespace = %config.namespace,
                block_matching = %config.block_matching,
                "Starting Index Health Exporter on {}",
                addr
            );

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }

        Commands::Once => {
            let collector = IndexHealthCollector::from_config(&config)?;
            match collector.poll().await {
                Ok(records) => {
                    let records: Vec<_> = records.values().collect();
                    println!("{}", serde_json::to_string_pretty(&records)?);
                }
                Err(e) => {
                    eprintln!("Poll failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
