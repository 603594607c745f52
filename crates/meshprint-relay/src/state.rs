//! Shared application state.
//!
//! The relay itself is stateless; the shared state is just the upstream
//! configuration and a pooled HTTP client.

use std::sync::Arc;

use crate::config::Config;

/// Shared application state.
pub struct AppState {
    /// Pooled client for all upstream calls.
    pub http: reqwest::Client,

    /// Upstream configuration.
    pub config: Config,
}

impl AppState {
    /// Create a new AppState wrapped in Arc.
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            http: reqwest::Client::new(),
            config,
        })
    }
}
