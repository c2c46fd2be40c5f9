//! Game-master console server.
//!
//! Wires the session executor to its transports: the local console, telnet
//! sessions, the web page with its WebSocket feed, and the attack form.

pub mod autofight;
pub mod config;
pub mod content;
pub mod error;
pub mod executor;
pub mod hub;
pub mod routes;
pub mod state;
pub mod transport;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use gmconsole_core::clock::SystemClock;
use gmconsole_core::rng::SystemRng;
use gmconsole_dice::remote::{PoolSettings, RandomOrgClient, RemoteOracle};
use gmconsole_dice::{DiceOracle, LocalOracle};
use gmconsole_session::application::session::Session;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{DiceBackend, ServerConfig};
use crate::content::JsonContentDir;
use crate::error::AppError;
use crate::executor::SessionExecutor;
use crate::hub::Hub;
use crate::state::AppState;

/// Builds the HTTP router.
pub fn build_router(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    Router::new()
        .merge(routes::health::router())
        .merge(routes::view::router())
        .merge(routes::attack::router())
        .merge(routes::char::router())
        .merge(routes::ws::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn dice_oracle(backend: &DiceBackend) -> Box<dyn DiceOracle> {
    match backend {
        DiceBackend::Local => Box::new(LocalOracle::new(SystemRng::from_os())),
        DiceBackend::RandomOrg { api_key } => {
            let client = RandomOrgClient::new(api_key.clone());
            let (oracle, _refill) = RemoteOracle::spawn(Arc::new(client), PoolSettings::default());
            Box::new(oracle)
        }
    }
}

fn bind_addr(host: &str, port: u16) -> Result<SocketAddr, AppError> {
    format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
}

/// Loads the session and serves every transport until the HTTP server stops.
///
/// # Errors
///
/// Returns an error when content cannot be loaded or a listener cannot be
/// bound.
pub async fn run(config: ServerConfig) -> Result<(), AppError> {
    let config = Arc::new(config);

    let content = JsonContentDir::new(config.content_dir.clone(), config.players.clone());
    let session = Session::new(
        Box::new(content),
        dice_oracle(&config.dice),
        Box::new(SystemClock),
    )?;

    let (hub, _hub_task) = Hub::spawn();
    let (handle, _executor_task) = SessionExecutor::spawn(session, hub.clone(), config.pacing);
    let state = AppState::new(handle.clone(), hub, Arc::clone(&config));

    let telnet_addr = bind_addr(&config.host, config.telnet_port)?;
    let telnet = TcpListener::bind(telnet_addr).await?;
    tokio::spawn(transport::telnet::serve(telnet, state.clone()));

    if config.console {
        tokio::spawn(async move {
            let stdin = BufReader::new(tokio::io::stdin());
            if let Err(e) = transport::console::run(stdin, tokio::io::stdout(), handle).await {
                warn!(error = %e, "console stopped");
            }
        });
    }

    let addr = bind_addr(&config.host, config.port)?;
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}
