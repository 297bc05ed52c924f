//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::config::{Config, ServerConfig};
use crate::dispatch::{ConnectionRegistry, Dispatcher};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Event dispatcher (owns a handle to the registry)
    pub dispatcher: Arc<Dispatcher>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create state around an existing dispatcher
    pub fn new(dispatcher: Dispatcher, config: ServerConfig) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Build the registry and dispatcher from a full config
    pub fn from_config(config: &Config) -> Self {
        let dispatcher = Dispatcher::new(
            Arc::new(ConnectionRegistry::new()),
            config.dispatcher.clone(),
            config.cors.clone(),
        );
        Self::new(dispatcher, config.server.clone())
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Number of users currently in the registry
    pub async fn connection_count(&self) -> usize {
        self.dispatcher.registry().size().await
    }
}
