//! Shared application state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::executor::SessionHandle;
use crate::hub::Hub;

/// Application state shared across all request handlers and transports.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Inbox of the session executor.
    pub session: SessionHandle,
    /// Connection hub.
    pub hub: Hub,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(session: SessionHandle, hub: Hub, config: Arc<ServerConfig>) -> Self {
        Self {
            session,
            hub,
            config,
        }
    }
}
