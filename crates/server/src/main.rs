use std::path::PathBuf;

use soulbridge_server::{AppConfig, AppState, build_router, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soulbridge_server=info,tower_http=info".into()),
        )
        .init();

    let data_dir = std::env::var("SOULBRIDGE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"));

    tracing::info!("data directory: {}", data_dir.display());

    let db = storage::init_db(&data_dir)?;
    tracing::info!("database initialized");

    let config = AppConfig::from_env();
    let base_url = config.base_url.clone();
    let state = AppState::new(db, config);

    let caches = state.caches.clone();
    let sweep_every = state.config.cache_ttl.max(std::time::Duration::from_secs(60));
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(sweep_every);
        loop {
            tick.tick().await;
            let dropped = caches.readings.purge_expired() + caches.entitlements.purge_expired();
            if dropped > 0 {
                tracing::debug!("purged {dropped} stale cache entries");
            }
        }
    });

    let app = build_router(state);

    tracing::info!("starting server at {base_url}");

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
