use assessment_backend::config::{get_config, init_config};
use assessment_backend::routes::app;
use assessment_backend::storage::memory::InMemoryStore;
use assessment_backend::utils::time::SystemClock;
use assessment_backend::AppState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    init_config()?;
    let config = get_config();

    let store = Arc::new(InMemoryStore::new());
    let state = AppState::new(store, Arc::new(SystemClock), config.display_timezone_offset);

    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    tracing::info!("Listening on {}", config.server_address);
    axum::serve(listener, app(state)).await?;

    Ok(())
}
