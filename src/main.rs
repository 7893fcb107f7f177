use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lectern::auth::StaticTokenAuthorizer;
use lectern::config::{Config, StorageKind};
use lectern::engine::Engine;
use lectern::http::{AppState, create_router};
use lectern::store::ScheduleStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    lectern::observability::init(config.metrics_port)?;

    if config.using_dev_token {
        warn!("LECTERN_LECTURER_TOKEN not set; using the development token");
    }

    let engine = match config.storage {
        StorageKind::Wal => {
            // Ensure data directory exists
            std::fs::create_dir_all(&config.data_dir)?;
            Arc::new(Engine::open(&config.wal_path())?)
        }
        StorageKind::Memory => {
            warn!("in-memory storage: nothing will survive a restart");
            Arc::new(Engine::in_memory())
        }
    };

    let compactor_engine = engine.clone();
    let threshold = config.compact_threshold;
    tokio::spawn(async move {
        lectern::compactor::run_compactor(compactor_engine, threshold).await;
    });

    let store: Arc<dyn ScheduleStore> = engine.clone();
    let state = AppState::new(
        store.clone(),
        Arc::new(StaticTokenAuthorizer::new(config.lecturer_token.clone())),
    );
    let app = create_router(state, config.static_dir.as_deref());

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("lectern listening on {addr}");
    info!("  storage: {:?}", config.storage);
    info!("  data_dir: {}", config.data_dir.display());
    let metrics = config
        .metrics_port
        .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"));
    info!("  metrics: {metrics}");
    if let Some(dir) = &config.static_dir {
        info!("  static: {}", dir.display());
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("draining store...");
    store.close().await?;
    info!("lectern stopped");
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
    info!("shutdown signal received, stopping accept loop");
}
