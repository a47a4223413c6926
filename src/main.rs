//! PDF Toolkit Server
//!
//! Authenticated HTTP endpoints for PDF text, table, form and image
//! extraction, page splitting, rasterization and redaction.

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdf_toolkit_server::config::Config;
use pdf_toolkit_server::routes::build_router;
use pdf_toolkit_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "pdf_toolkit_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    tracing::info!("Starting PDF Toolkit Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Job pool: {} concurrent, {}s timeout; upload limit {} MiB",
        config.jobs.max_concurrent,
        config.jobs.timeout_secs,
        config.server.max_upload_mb
    );
    if config.auth.users.is_empty() {
        tracing::warn!("API_USERS is empty - every /api request will be rejected with 401");
    } else {
        tracing::info!("{} API users configured", config.auth.users.len());
    }

    let host = config.server.host.clone();
    let port = config.server.port;
    let app = build_router(AppState::new(config));

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    let addr = listener.local_addr().context("Listener has no local address")?;
    tracing::info!("PDF Toolkit Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

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
