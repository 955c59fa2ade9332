//! Engine configuration
//!
//! Loaded from YAML:
//!
//! ```yaml
//! backend:
//!   baseUrl: http://localhost:3000/api
//!   timeoutSecs: 30
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.

use crate::error::{OndcError, OndcResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Session/flow backend connection
    #[serde(default)]
    pub backend: BackendConfig,
}

/// Session/flow backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Base URL of the backend API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("ondc-workbench/{}", crate::VERSION)
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl EngineConfig {
    /// Parse configuration from a YAML string
    pub fn from_yaml_str(content: &str) -> OndcResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| OndcError::config(format!("Failed to parse config YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> OndcResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            OndcError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded engine config");
        Self::from_yaml_str(&content)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.backend.base_url = url.into();
        self
    }

    pub fn validate(&self) -> OndcResult<()> {
        let url = self.backend.base_url.trim();
        if url.is_empty() {
            return Err(OndcError::config("backend.baseUrl must not be empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(OndcError::config(format!(
                "backend.baseUrl must be an http(s) URL, got '{}'",
                url
            )));
        }
        if self.backend.timeout_secs == 0 {
            return Err(OndcError::config("backend.timeoutSecs must be positive"));
        }
        Ok(())
    }
}
