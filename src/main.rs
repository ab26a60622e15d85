use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use shift_engine::api::{AppState, create_router};
use shift_engine::config::ConfigLoader;
use shift_engine::store::SqliteStore;
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "./config/engine.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shift_engine=info".into()),
        )
        .init();

    let config_path =
        std::env::var("SHIFT_ENGINE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = ConfigLoader::load(&config_path).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        ConfigLoader::default()
    });

    let db_path = config.config().database.path.clone();
    ensure_parent_dir(&db_path)?;
    info!(path = %db_path, "opening SQLite database");
    let store = Arc::new(SqliteStore::open(&db_path)?);

    let state = AppState::new(store, &config);
    let app = create_router(state);

    let server = &config.config().server;
    let addr: SocketAddr = format!("{}:{}", server.bind, server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "shift engine listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("shift engine stopped");
    Ok(())
}

fn ensure_parent_dir(path: &str) -> std::io::Result<()> {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
