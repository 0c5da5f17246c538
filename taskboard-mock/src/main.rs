//! Mock backend entry point.

use taskboard_mock::{Database, ServerConfig, serve};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,taskboard_mock=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::warn!("Failed to load configuration from environment: {error}");
            tracing::info!("Using default configuration");
            ServerConfig::default()
        }
    };

    let database = match &config.db_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading database");
            Database::load(path)?
        }
        None => Database::seeded(),
    };

    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!("Mock backend started on http://{bind_address}");
    tracing::info!("  POST /login, POST /register");
    tracing::info!("  GET|POST /projects, GET|PUT|PATCH|DELETE /projects/{{id}}");
    tracing::info!("  GET|POST /users, GET|PUT|PATCH|DELETE /users/{{id}}");

    serve(listener, database, shutdown_signal()).await?;

    tracing::info!("Mock backend stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(error) => tracing::error!("Failed to listen for CTRL+C: {error}"),
    }
}
