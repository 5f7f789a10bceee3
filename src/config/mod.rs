//! Configuration
//!
//! Layered settings for logging and row loading. See [`ConfigLoader`] for the
//! source precedence.

mod facade;
mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,
}

/// Settings used when a store loads rows through a proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// HTTP request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Key of the rows array when the loaded document is an object
    #[serde(default)]
    pub rows_key: Option<String>,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    format!("datastore/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            user_agent: default_user_agent(),
            rows_key: None,
        }
    }
}

impl DataConfig {
    /// Reject values that deserialize but cannot be used
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        if self.proxy.request_timeout_ms == 0 {
            return Err(crate::error::ConfigError::Invalid(
                "proxy.request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.proxy.user_agent.trim().is_empty() {
            return Err(crate::error::ConfigError::Invalid(
                "proxy.user_agent must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
