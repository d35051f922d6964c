use std::env;
use std::time::Duration;

use stroll_agents::{ResolverConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use stroll_core::ResponseMode;
use tracing::warn;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub gemini_api_key: Option<String>,
    pub maps_api_key: Option<String>,
    pub gemini_base_url: String,
    pub model: String,
    pub response_mode: ResponseMode,
    pub allowed_origins: Vec<String>,
    pub connect_timeout: Duration,
    pub http_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            gemini_api_key: None,
            maps_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            response_mode: ResponseMode::default(),
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            connect_timeout: Duration::from_secs(6),
            http_timeout: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source; unparsable values fall
    /// back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let response_mode = match non_empty("STROLL_RESPONSE_MODE") {
            Some(value) => ResponseMode::parse(&value).unwrap_or_else(|| {
                warn!(value = %value, "unknown STROLL_RESPONSE_MODE, using default");
                defaults.response_mode
            }),
            None => defaults.response_mode,
        };

        let allowed_origins = non_empty("STROLL_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.allowed_origins);

        let http_timeout = non_empty("STROLL_HTTP_TIMEOUT_SECONDS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        Self {
            bind: non_empty("STROLL_BIND").unwrap_or(defaults.bind),
            gemini_api_key: non_empty("STROLL_GEMINI_API_KEY")
                .or_else(|| non_empty("GEMINI_API_KEY")),
            maps_api_key: non_empty("STROLL_MAPS_API_KEY"),
            gemini_base_url: non_empty("STROLL_GEMINI_BASE_URL")
                .unwrap_or(defaults.gemini_base_url),
            model: non_empty("STROLL_MODEL").unwrap_or(defaults.model),
            response_mode,
            allowed_origins,
            connect_timeout: defaults.connect_timeout,
            http_timeout,
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            api_key: self.gemini_api_key.clone(),
            maps_api_key: self.maps_api_key.clone(),
            mode: self.response_mode,
        }
    }
}
