use anyhow::Context;
use common_observability::InventoryMetrics;
use inventory_service::{
    build_router, cors_layer, with_static_dir, AppState, ProductStore, ServiceConfig,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(?err, "failed to install Ctrl+C handler");
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
                error!(?err, "failed to install SIGTERM handler");
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

    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServiceConfig::from_env().context("invalid service configuration")?;

    // The store must be usable before the listener accepts anything; failure exits with status 1.
    let store = match ProductStore::open(&config.store).await {
        Ok(store) => store,
        Err(err) => {
            error!(error = %err, path = %config.store.path, "failed to open product store");
            return Err(err).context("failed to open product store");
        }
    };
    info!(path = %config.store.path, "product store opened");

    let metrics = Arc::new(InventoryMetrics::new());
    let state = AppState::new(store.clone(), metrics.clone());

    let app = with_static_dir(build_router(state), &config.static_dir)
        .layer(cors_layer(&config.allowed_origins));

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "starting inventory-service");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    metrics.store_ready.set(0);
    info!("product store closed");
    Ok(())
}
