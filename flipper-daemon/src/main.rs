//! SkyBlock Market Feed daemon
//!
//! Runs the market services in the background and serves their snapshots
//! over a small read-only HTTP API.

mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use flipper_core::FlipperConfig;
use flipper_services::Orchestrator;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Delay between initialization attempts after a failed startup
const INIT_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,flipper_services=debug")),
        )
        .init();

    let config = FlipperConfig::from_env()?;
    info!(
        "Starting SkyBlock market feed (data dir {}, API {})",
        config.data_dir.display(),
        config.api_base_url
    );
    let port = config.server_port;

    let orchestrator = Arc::new(Orchestrator::new(config));

    // Initialize in the background so the HTTP surface is up immediately
    let init = Arc::clone(&orchestrator);
    tokio::spawn(async move {
        while !init.initialize_all().await {
            warn!("Initialization failed, retrying in {:?}", INIT_RETRY_DELAY);
            tokio::time::sleep(INIT_RETRY_DELAY).await;
        }
    });

    let state = AppState {
        orchestrator: Arc::clone(&orchestrator),
    };

    // Configure CORS for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .nest("/api", routes::api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    orchestrator.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
    }
}
