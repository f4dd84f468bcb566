mod admin;
mod auth;
mod composer;
mod config;
mod error;
mod handlers;
mod layout_api;
mod request_context;
mod routes;
mod state;
mod upload;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::ServerConfig::from_env();
    tracing::info!("Starting Echhapa backend server");
    tracing::info!("Database: {}", config.db_path.display());
    tracing::info!("Uploads directory: {}", config.uploads_dir.display());

    let addr = format!("{}:{}", config.bind_addr, config.port);
    let app_state = state::AppState::new(config)?;

    let app = routes::create_router(app_state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
