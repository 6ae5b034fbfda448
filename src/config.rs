//! Host configuration parsed from the environment and config files.

use std::path::Path;

use canvas::engine::CanvasConfig;

use crate::error::HostError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

impl HttpTimeouts {
    /// Read timeouts from the environment.
    ///
    /// Optional:
    /// - `LAYOUTPAD_REQUEST_TIMEOUT_SECS`: default 30
    /// - `LAYOUTPAD_CONNECT_TIMEOUT_SECS`: default 10
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            request_secs: env_parse_u64("LAYOUTPAD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("LAYOUTPAD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

/// Where the auth backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub base_url: String,
    pub timeouts: HttpTimeouts,
}

impl HostConfig {
    /// Build from the CLI-resolved base URL plus environment timeouts.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self { base_url: normalize_base_url(base_url), timeouts: HttpTimeouts::from_env() }
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Parse engine tunables. Missing fields keep their defaults.
pub fn parse_canvas_config(raw: &str) -> Result<CanvasConfig, HostError> {
    Ok(serde_json::from_str(raw)?)
}

/// Load engine tunables from an optional JSON file.
pub async fn load_canvas_config(path: Option<&Path>) -> Result<CanvasConfig, HostError> {
    let Some(path) = path else {
        return Ok(CanvasConfig::default());
    };
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| HostError::Io { path: path.display().to_string(), source })?;
    parse_canvas_config(&raw)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
