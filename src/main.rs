use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber;

use floodgate::config::FloodgateConfig;
use floodgate::http::HttpServer;
use floodgate::ratelimit::{ClientRegistry, Reclaimer};

/// Command-line options. Flags override values loaded from the
/// configuration file.
#[derive(Parser, Debug)]
#[command(name = "floodgate", version, about = "Per-client admission control gate")]
struct Args {
    /// Path to a YAML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Address to bind the HTTP server to
    #[arg(long)]
    listen_addr: Option<SocketAddr>,

    /// Tokens replenished per second for each client bucket
    #[arg(long)]
    requests_per_second: Option<f64>,

    /// Maximum burst size for each client bucket
    #[arg(long)]
    burst: Option<u32>,

    /// Disable rate limiting entirely
    #[arg(long)]
    disable_rate_limiting: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    info!("Starting Floodgate Admission Control");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    // Load configuration, then apply command-line overrides
    let mut config = match args.config.as_deref() {
        Some(path) => FloodgateConfig::from_file(path)?,
        None => FloodgateConfig::default(),
    };
    if let Some(listen_addr) = args.listen_addr {
        config.server.listen_addr = listen_addr;
    }
    if let Some(requests_per_second) = args.requests_per_second {
        config.rate_limiting.requests_per_second = requests_per_second;
    }
    if let Some(burst) = args.burst {
        config.rate_limiting.burst = burst;
    }
    if args.disable_rate_limiting {
        config.rate_limiting.enabled = false;
    }
    config.validate()?;

    info!(
        listen_addr = %config.server.listen_addr,
        enabled = config.rate_limiting.enabled,
        requests_per_second = config.rate_limiting.requests_per_second,
        burst = config.rate_limiting.burst,
        "Configuration loaded"
    );

    // Initialize the client registry shared by the gate and the reclaimer
    let registry = Arc::new(ClientRegistry::new(
        config.rate_limiting.burst,
        config.rate_limiting.requests_per_second,
    ));

    // The reclaimer runs for the lifetime of the process; it is abandoned
    // at shutdown
    if config.rate_limiting.enabled {
        let reclaimer = Reclaimer::new(
            registry.clone(),
            config.rate_limiting.sweep_interval(),
            config.rate_limiting.stale_after(),
        );
        let _ = reclaimer.spawn();
    }

    let server = HttpServer::new(&config, registry);

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;

    info!("Floodgate stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
