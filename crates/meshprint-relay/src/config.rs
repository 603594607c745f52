//! Relay configuration.

use std::env;

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server bind address.
    pub bind_addr: String,

    /// Base URL of the generation service.
    pub generation_base_url: String,

    /// Base URL of the upload service.
    pub upload_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".to_string(),
            generation_base_url: "https://api.meshy.ai".to_string(),
            upload_base_url: "https://api.formlabs.com/form-now".to_string(),
        }
    }
}

impl Config {
    /// Load configuration, letting environment variables override defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env::var("MESHPRINT_BIND_ADDR").unwrap_or(defaults.bind_addr),
            generation_base_url: env::var("MESHPRINT_GENERATION_URL")
                .unwrap_or(defaults.generation_base_url),
            upload_base_url: env::var("MESHPRINT_UPLOAD_URL").unwrap_or(defaults.upload_base_url),
        }
    }
}
