//! Game-master console server entry point.

use std::error::Error;

use gmconsole_server::config::ServerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting game-master console");

    let config = ServerConfig::from_env()?;
    gmconsole_server::run(config).await?;

    Ok(())
}
