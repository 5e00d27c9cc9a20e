// src/config.rs
use std::net::SocketAddr;

use crate::errors::QuanBuyError;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Runtime settings for both the assistant service and the CLI client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` puts the service in mock mode (canned fallbacks, no Gemini calls).
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_endpoint: String,
    /// `None` disables result caching.
    pub redis_url: Option<String>,
    pub cache_ttl_secs: u64,
    pub bind_addr: SocketAddr,
    pub backend_url: String,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// Loads `.env` (if any) and then reads the process environment.
    pub fn load() -> Result<Self, QuanBuyError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key))
    }

    pub fn gemini_configured(&self) -> bool {
        self.gemini_api_key.is_some()
    }

    /// Parses configuration through `lookup` so tests never touch the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, QuanBuyError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let or_default = |var: &str, default: &str| -> String {
            lookup(var).unwrap_or_else(|_| default.to_string())
        };

        let parse_u64 = |var: &str, default: &str| -> Result<u64, QuanBuyError> {
            or_default(var, default)
                .parse::<u64>()
                .map_err(|e| QuanBuyError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: e.to_string(),
                })
        };

        let gemini_api_key = lookup("GEMINI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != "mock_mode");

        let redis_url = match lookup("REDIS_URL") {
            Ok(url) if !url.trim().is_empty() => Some(url),
            _ => match lookup("REDIS_HOST") {
                Ok(host) if !host.trim().is_empty() => {
                    let port = parse_u64("REDIS_PORT", "6379")?;
                    Some(format!("redis://{host}:{port}"))
                }
                _ => None,
            },
        };

        let raw_bind = or_default("QUANBUY_BIND_ADDR", "0.0.0.0:8080");
        let bind_addr =
            raw_bind
                .parse::<SocketAddr>()
                .map_err(|e| QuanBuyError::InvalidEnvVar {
                    var: "QUANBUY_BIND_ADDR".to_string(),
                    reason: e.to_string(),
                })?;

        Ok(Self {
            gemini_api_key,
            gemini_model: or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_endpoint: or_default("GEMINI_API_ENDPOINT", DEFAULT_GEMINI_ENDPOINT)
                .trim_end_matches('/')
                .to_string(),
            redis_url,
            cache_ttl_secs: parse_u64("QUANBUY_CACHE_TTL_SECS", "3600")?,
            bind_addr,
            backend_url: or_default("QUANBUY_BACKEND_URL", "http://localhost:8080")
                .trim_end_matches('/')
                .to_string(),
            request_timeout_secs: parse_u64("QUANBUY_REQUEST_TIMEOUT_SECS", "60")?,
        })
    }
}
