//! Cookie collector service.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────────┐
//!                          │                   COOKIE COLLECTOR                    │
//!                          │                                                      │
//!   Extension request      │  ┌────────┐   ┌────────┐   ┌──────┐   ┌──────────┐   │
//!   ───────────────────────┼─▶│ origin │──▶│  rate  │──▶│ auth │──▶│ validate │   │
//!                          │  │ guard  │   │ limit  │   │      │   │ payload  │   │
//!                          │  └────────┘   └────────┘   └──────┘   └────┬─────┘   │
//!                          │                                            │         │
//!                          │                                            ▼         │
//!   Response               │  ┌──────────┐                       ┌───────────┐   │
//!   ◀──────────────────────┼──│ response │◀──────────────────────│ ingestion │◀──┼── MongoDB
//!                          │  │  (JSON)  │                       │   store   │   │
//!                          │  └──────────┘                       └───────────┘   │
//!                          │                                                      │
//!                          │  config · observability · resilience · lifecycle     │
//!                          └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cookie_collector::config::load_config;
use cookie_collector::http::HttpServer;
use cookie_collector::lifecycle::{signals, startup, Shutdown};
use cookie_collector::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "cookie-collector")]
#[command(about = "Cookie ingestion service", long_about = None)]
struct Args {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "COLLECTOR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    logging::init(&config.observability.log_level);

    tracing::info!("cookie-collector v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        storage = ?config.storage.backend,
        rate_limit_enabled = config.rate_limit.enabled,
        window_secs = config.rate_limit.window_secs,
        max_requests = config.rate_limit.max_requests,
        storage_timeout_ms = config.storage.timeout_ms,
        "Configuration loaded"
    );
    if config.cors.normalized_origin().is_none() {
        tracing::warn!("No allowed origin configured; all cross-origin browser requests will be refused");
    }

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let store = startup::init_store(&config.storage).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, store);
    let mut server_task = tokio::spawn(server.run(listener, shutdown.clone()));

    // The server may also stop on its own (e.g. accept loop error)
    let finished = tokio::select! {
        result = &mut server_task => Some(result),
        _ = signals::shutdown_on_signal(&shutdown) => None,
    };
    match finished {
        Some(result) => result??,
        None => server_task.await??,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
