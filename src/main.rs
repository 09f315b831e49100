use anyhow::{Context, Result};
use axum::Router;
use std::io::ErrorKind;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting media-archive with config: {:?}", cfg);

    // --- Load the blog corpus; an unreadable directory is fatal ---
    let report = services::corpus_service::load_corpus(&cfg.entries_dir)
        .context("loading blog entries")?;
    for skipped in &report.skipped {
        tracing::warn!("Skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    let corpus = report.into_corpus();
    if corpus.is_empty() {
        tracing::warn!("No blog entries found in {}", cfg.entries_dir.display());
    }

    if !cfg.raw_root.is_dir() {
        tracing::warn!(
            "Raw media root {} is not a directory; gallery requests will 404",
            cfg.raw_root.display()
        );
    }

    // --- Build router ---
    let addr = cfg.addr();
    let port = cfg.port;
    let wildcard_host = matches!(cfg.host.as_str(), "0.0.0.0" | "::");
    let app: Router = routes::routes::routes()
        .with_state(state::AppState::new(cfg, corpus))
        .layer(TraceLayer::new_for_http());

    // --- Start server ---
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) if err.kind() == ErrorKind::PermissionDenied && wildcard_host => {
            let fallback_addr = format!("127.0.0.1:{}", port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
