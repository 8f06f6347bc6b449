//! Petstore API server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (request id, trace, timeout, body limit)
//!                         │
//!                         ▼
//!                     dispatch::ApiService ── routing::RouteTable ──▶ 404 / 405
//!                         │
//!                         ▼
//!                     dispatch::Dispatcher (span, counters, stopwatch)
//!                         │  decode → petstore::Handler → encode
//!                         ▼
//!     Client Response ◀── response or ErrorHandler output
//!
//!     Cross-cutting: config (TOML), observability (tracing + Prometheus),
//!                    lifecycle (signals, graceful shutdown)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use oas_pipeline::config::{load_config, ApiConfig};
use oas_pipeline::http::ApiServer;
use oas_pipeline::lifecycle::{shutdown_signal, Shutdown};
use oas_pipeline::observability::logging::init_logging;
use oas_pipeline::observability::metrics::init_metrics;
use oas_pipeline::observability::Instrumentation;
use oas_pipeline::petstore::{self, MemoryPetStore};

#[derive(Parser)]
#[command(name = "oas-pipeline")]
#[command(about = "Instrumented petstore API server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ApiConfig::default(),
    };

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "oas-pipeline starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    let instruments = Arc::new(Instrumentation::from_config(&config.observability));
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        init_metrics(addr, &instruments)?;
    }

    let store = Arc::new(MemoryPetStore::new());
    let service = Arc::new(petstore::service(store, instruments, &config)?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let drained = shutdown.wait();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.trigger();
        }
    });

    ApiServer::new(service, &config)
        .run(listener, drained)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
