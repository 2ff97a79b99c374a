use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use route_monitor::handlers::items::Catalog;
use route_monitor::server::{self, AppState};
use route_monitor::{logging, Monitor, MonitorConfig};

/// Demo service: an in-memory item catalog instrumented by the monitor.
#[derive(Debug, Parser)]
#[command(name = "route-monitor", version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000")]
    listen: SocketAddr,

    /// Optional TOML file overriding monitor capacities
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let args = Args::parse();

    // ── 1. Load configuration ────────────────────────────────────
    let config = match &args.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading monitor config");
            MonitorConfig::load(path)?
        }
        None => MonitorConfig::default(),
    };

    // ── 2. Build shared state ────────────────────────────────────
    let state = AppState {
        monitor: Arc::new(Monitor::new(config)?),
        catalog: Arc::new(Catalog::seeded()),
    };

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(args.listen).await?;

    tracing::info!(addr = %args.listen, "server listening");
    tracing::info!("snapshot  → http://{}/api/monitoring", args.listen);
    tracing::info!("stream    → http://{}/api/monitoring/stream", args.listen);
    tracing::info!("requests  → http://{}/api/monitoring/requests", args.listen);

    axum::serve(listener, app).await?;
    Ok(())
}
