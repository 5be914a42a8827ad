//! Client configuration.

use std::time::Duration;
use url::Url;

use crate::error::ApiError;

/// Default API base URL, overridable via `TESSERA_API_BASE_URL`.
const DEFAULT_BASE_URL: &str = "https://api.salgadosdomarques.pt/api/v1";

/// Environment variable that overrides the API base URL.
const BASE_URL_ENV: &str = "TESSERA_API_BASE_URL";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL all endpoint paths are joined to.
    pub base_url: Url,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Build a configuration from the environment.
    ///
    /// Uses `TESSERA_API_BASE_URL` when set, otherwise the production
    /// base URL.
    pub fn from_env() -> Result<Self, ApiError> {
        let raw = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(&raw)
    }

    /// Build a configuration for an explicit base URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        // Url::join treats a path without a trailing slash as a file and
        // would drop its last segment, so normalize here.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| ApiError::InvalidConfig(format!("invalid base URL {:?}: {}", base_url, e)))?;

        Ok(Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Join an endpoint path onto the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidConfig(format!("invalid endpoint path {:?}: {}", path, e)))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        // The compile-time default URL always parses
        Self::with_base_url(DEFAULT_BASE_URL).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_parses() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.base_url.as_str().ends_with("/api/v1/"));
    }

    #[test]
    fn endpoint_join_keeps_base_path() {
        let config = ClientConfig::with_base_url("https://example.com/api/v1").unwrap();
        let url = config.endpoint("/loyalty/summary").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/loyalty/summary");
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let a = ClientConfig::with_base_url("https://example.com/api/v1").unwrap();
        let b = ClientConfig::with_base_url("https://example.com/api/v1/").unwrap();
        assert_eq!(a.base_url, b.base_url);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(ClientConfig::with_base_url("not a url").is_err());
    }
}
