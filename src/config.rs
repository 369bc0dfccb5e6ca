// src/config.rs
use std::time::Duration;

/// Environment variable naming the backend origin, e.g. `http://localhost:8080/api`.
pub const API_URL_ENV: &str = "TRANSFORMER_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// How long a toast stays on screen before it dismisses itself.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(6);
/// Horizontal travel (px) a touch must exceed to count as a swipe.
pub const SWIPE_THRESHOLD_PX: f32 = 40.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub notification_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            request_timeout: REQUEST_TIMEOUT,
            notification_ttl: NOTIFICATION_TTL,
        }
    }

    pub fn from_env() -> Self {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::with_base_url(&url),
            _ => Self::default(),
        }
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_dropped() {
        let config = ClientConfig::with_base_url("http://backend:8080/api/ ");
        assert_eq!(config.base_url, "http://backend:8080/api");
    }

    #[test]
    fn default_points_at_local_backend() {
        assert_eq!(ClientConfig::default().base_url, DEFAULT_API_URL);
    }
}
