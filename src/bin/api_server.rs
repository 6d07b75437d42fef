// API server binary entry point.
//
// Purpose: start the Axum server over the scoring orchestrator.
// Usage: cargo run --features api --bin api_server

use std::net::SocketAddr;

use sqi_scorer_rust::api_server::{create_router, AppState};
use sqi_scorer_rust::elevation::EPQS_URL;
use sqi_scorer_rust::ssurgo::SDA_URL;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // Default log level: info for our crate, warn for others
                "sqi_scorer_rust=info,tower_http=debug,warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    // Configuration from environment variables
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data/raw_data".to_string());
    let sda_url = std::env::var("SDA_URL").unwrap_or_else(|_| SDA_URL.to_string());
    let epqs_url = std::env::var("EPQS_URL").unwrap_or_else(|_| EPQS_URL.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    tracing::info!("Configuration:");
    tracing::info!("  DATA_DIR: {}", data_dir);
    tracing::info!("  SDA_URL: {}", sda_url);
    tracing::info!("  EPQS_URL: {}", epqs_url);
    tracing::info!("  PORT: {}", port);

    tracing::info!("Initializing application state...");
    let state = AppState::new(&data_dir, &sda_url, &epqs_url).await?;
    tracing::info!("Application state initialized successfully");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
