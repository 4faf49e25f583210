//! Ambassador (v1)
//!
//! Drives a TCP-connect workload through a resilient ambassador and reports
//! endpoint health and call metrics.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────┐
//!                   │                    AMBASSADOR                    │
//!     execute()     │  ┌─────────┐   ┌──────────────┐   ┌──────────┐   │
//!     ──────────────┼─▶│  retry  │──▶│load_balancer │──▶│   pool   │───┼──▶ Endpoint
//!                   │  │ policy  │   │ + breakers   │   │          │   │
//!                   │  └─────────┘   └──────────────┘   └──────────┘   │
//!     result        │       ▲               │ outcome                  │
//!     ◀─────────────┼───────┴───────────────┘                          │
//!                   │                                                  │
//!                   │  ┌────────────────────────────────────────────┐  │
//!                   │  │           Cross-Cutting Concerns           │  │
//!                   │  │  config · health · observability · admin   │  │
//!                   │  └────────────────────────────────────────────┘  │
//!                   └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;

use ambassador::admin::{self, AdminState};
use ambassador::config::{read_config, AmbassadorConfig, EndpointConfig};
use ambassador::health::HealthMonitor;
use ambassador::observability::{logging, metrics};
use ambassador::{Ambassador, AmbassadorError, CachingCaller, OperationError, RemoteCaller, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "ambassador", version, about = "Resilient remote-call ambassador")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra endpoint as NAME=HOST:PORT (repeatable)
    #[arg(short, long = "endpoint", value_parser = parse_endpoint)]
    endpoints: Vec<EndpointConfig>,

    /// Total calls to make
    #[arg(short, long, default_value_t = 20)]
    requests: usize,

    /// Concurrent callers
    #[arg(long, default_value_t = 4)]
    concurrency: usize,
}

fn parse_endpoint(raw: &str) -> Result<EndpointConfig, String> {
    match raw.split_once('=') {
        Some((name, address)) if !name.is_empty() && !address.is_empty() => {
            Ok(EndpointConfig::new(name, address))
        }
        _ => Err(format!("expected NAME=HOST:PORT, got '{}'", raw)),
    }
}

/// Connect and immediately drop: reachability is the whole call.
async fn connect(address: String) -> Result<(), OperationError> {
    TcpStream::connect(&address).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => AmbassadorConfig::default(),
    };
    config.endpoints.extend(args.endpoints.iter().cloned());

    logging::init_logging(&config.observability);
    tracing::info!("ambassador v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.prometheus_enabled {
        if let Ok(addr) = config.observability.prometheus_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                prometheus_address = %config.observability.prometheus_address,
                "Failed to parse metrics address"
            );
        }
    }

    let ambassador = Arc::new(Ambassador::new(&config)?);
    let caching = CachingCaller::from_config(ambassador.clone(), &config.cache).map(Arc::new);
    if caching.is_some() {
        tracing::info!(ttl_secs = config.cache.ttl_secs, "Response cache enabled");
    }
    let shutdown = Shutdown::new();
    let mut tasks = Vec::new();

    if config.health_check.enabled {
        let monitor = HealthMonitor::new(ambassador.clone(), &config.health_check, connect);
        tasks.push(tokio::spawn(monitor.run(shutdown.token())));
    }

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState::new(ambassador.clone(), config.admin.api_key.as_str());
        let token = shutdown.token();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state, token).await {
                tracing::error!(error = %e, "Admin API stopped");
            }
        }));
    }

    // Idle connection eviction.
    {
        let ambassador = ambassador.clone();
        let token = shutdown.token();
        let period = config.pool.max_idle_time().max(Duration::from_secs(1));
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => { ambassador.cleanup_idle_connections(); }
                    _ = token.cancelled() => break,
                }
            }
        }));
    }

    tracing::info!(requests = args.requests, concurrency = args.concurrency, "Workload starting");
    let started = Instant::now();
    let total = args.requests;
    let next = Arc::new(AtomicUsize::new(0));
    let succeeded = Arc::new(AtomicUsize::new(0));
    let workers: Vec<_> = (0..args.concurrency.max(1))
        .map(|_| {
            let ambassador = ambassador.clone();
            let caching = caching.clone();
            let next = next.clone();
            let succeeded = succeeded.clone();
            let token = shutdown.token();
            tokio::spawn(async move {
                while !token.is_cancelled() && next.fetch_add(1, Ordering::Relaxed) < total {
                    let result = match &caching {
                        Some(caller) => caller.execute("tcp_connect", connect).await,
                        None => ambassador.execute_with_cancel("tcp_connect", connect, &token).await,
                    };
                    match result {
                        Ok(()) => {
                            succeeded.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(AmbassadorError::Cancelled) => break,
                        Err(_) => {}
                    }
                }
            })
        })
        .collect();

    tokio::select! {
        _ = async {
            for worker in workers {
                let _ = worker.await;
            }
        } => {}
        _ = shutdown.wait_for_signal() => {}
    }

    tracing::info!(
        succeeded = succeeded.load(Ordering::Relaxed),
        elapsed = ?started.elapsed(),
        "Workload complete"
    );

    let report = serde_json::json!({
        "endpoints": ambassador.endpoint_status(),
        "metrics": ambassador.metrics(),
        "pool": ambassador.pool_stats(),
        "cached_responses": caching.as_ref().map(|c| c.cache().len()),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    if config.admin.enabled && !shutdown.is_triggered() {
        tracing::info!("Admin API still serving, press Ctrl-C to exit");
        shutdown.wait_for_signal().await;
    }
    shutdown.trigger();

    for task in tasks {
        let _ = task.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
