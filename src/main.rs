//! Pharmacy Assistant Server
//!
//! Accepts prescription photos, extracts text and order fields, and serves
//! the pharmacy order dashboard API.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pharmacy_assistant_server::config::Config;
use pharmacy_assistant_server::db;
use pharmacy_assistant_server::ocr::OcrService;
use pharmacy_assistant_server::routes;
use pharmacy_assistant_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "pharmacy_assistant_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting Pharmacy Assistant Server v{}", env!("CARGO_PKG_VERSION"));

    tokio::fs::create_dir_all(&config.uploads.dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", config.uploads.dir.display()))?;
    tracing::info!("Uploads stored in {}", config.uploads.dir.display());

    // Initialize database
    let db_pool = db::create_pool(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database initialized at {}", config.database.url);

    // Initialize OCR provider chain
    let ocr = OcrService::from_config(&config.ocr, config.uploads.max_bytes)
        .context("Failed to initialize OCR service")?;
    let methods = ocr.configured_methods();
    if methods.is_empty() {
        tracing::warn!("No OCR provider configured, uploads will use client-side recognition");
    } else {
        tracing::info!("OCR providers: {:?}", methods);
    }
    tracing::info!("Order transition policy: {:?}", config.orders.transition_policy);

    let host = config.server.host.clone();
    let port = config.server.port;

    // Create application state and router
    let app_state = AppState::new(config, db_pool.clone(), ocr);
    let app = routes::app(app_state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;
    tracing::info!("Pharmacy Assistant Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
