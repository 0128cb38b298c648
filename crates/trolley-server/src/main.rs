use tracing_subscriber::EnvFilter;
use trolley_db::{DbManager, run_migrations};
use trolley_server::{ServerConfig, build_router, build_state};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .json()
        .init();

    let config = ServerConfig::from_env();

    let manager = DbManager::connect(&config.db).await?;
    run_migrations(manager.client()).await?;

    let state = build_state(manager.client().clone(), config.auth.clone());
    let router = build_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}
