//! Bridge configuration with validation.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default budget for a native command round trip.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("app_id cannot be empty")]
    EmptyAppId,

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid page_url '{0}'")]
    InvalidPageUrl(String),

    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Main bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Mini-app identifier registered with the host
    pub app_id: Option<String>,
    /// Timeout for native commands when the caller gives none
    pub default_timeout_ms: u64,
    /// Validate command inputs locally before sending
    pub strict_requests: bool,
    /// URL of the page the mini-app is served from. Required to build
    /// sign-in messages.
    pub page_url: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            strict_requests: true,
            page_url: None,
        }
    }
}

impl BridgeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MK_APP_ID`: Mini-app identifier (default: unset)
    /// - `MK_DEFAULT_TIMEOUT_MS`: Native command timeout (default: 30000)
    /// - `MK_STRICT_REQUESTS`: Local input validation (default: true)
    /// - `MK_PAGE_URL`: Page URL used for sign-in messages (default: unset)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self {
            app_id: env::var("MK_APP_ID").ok(),
            page_url: env::var("MK_PAGE_URL").ok(),
            ..Self::default()
        };

        if let Ok(value) = env::var("MK_DEFAULT_TIMEOUT_MS") {
            config.default_timeout_ms = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "MK_DEFAULT_TIMEOUT_MS",
                value: value.clone(),
            })?;
        }
        if let Ok(value) = env::var("MK_STRICT_REQUESTS") {
            config.strict_requests = !(value.eq_ignore_ascii_case("false") || value == "0");
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if matches!(&self.app_id, Some(id) if id.trim().is_empty()) {
            return Err(ConfigError::EmptyAppId);
        }

        if self.default_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "default timeout cannot be 0".into(),
            ));
        }

        if let Some(url) = &self.page_url {
            mk_01_siwe::PageContext::parse(url)
                .map_err(|_| ConfigError::InvalidPageUrl(url.clone()))?;
        }

        Ok(())
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}
