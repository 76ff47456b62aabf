//! CLI configuration
//!
//! `CliConfig` is the hidden `~/.outlyer.yaml` file written by
//! `outlyer configure`. `ApiConfig` is what the HTTP client is built from:
//! the persisted token plus defaults, overridden by environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ApiError;
use crate::Result;

/// Default Outlyer API endpoint
pub const DEFAULT_API_URL: &str = "https://api2.outlyer.com/v2";

/// User agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "outlyer/1.0";

/// Request timeout applied by the HTTP client
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// File name of the persisted configuration, relative to the home directory
pub const CONFIG_FILE_NAME: &str = ".outlyer.yaml";

/// Persisted user configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// API token used as the bearer credential
    #[serde(rename = "api-token", default)]
    pub api_token: String,
    /// Account used when `--account` is omitted
    #[serde(rename = "default-account", default)]
    pub default_account: String,
}

impl CliConfig {
    pub fn new(api_token: &str, default_account: &str) -> Self {
        CliConfig {
            api_token: api_token.to_string(),
            default_account: default_account.to_string(),
        }
    }

    /// `~/.outlyer.yaml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE_NAME))
            .ok_or_else(|| ApiError::Config("could not read user's home directory".to_string()))
    }

    /// Load from `path`. A missing file yields an empty configuration.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No configuration file at {:?}", path);
            return Ok(CliConfig::default());
        }
        let content = std::fs::read(path)?;
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(CliConfig::default());
        }
        Ok(serde_yaml::from_slice(&content)?)
    }

    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Write to `path` as YAML, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        debug!("Wrote configuration to {:?}", path);
        Ok(())
    }

    /// Write to the default location and return the path written
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// `Some(account)` when a non-empty default account is configured
    pub fn default_account(&self) -> Option<&str> {
        Some(self.default_account.as_str()).filter(|a| !a.is_empty())
    }
}

/// Settings for `HttpApiClient`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL, without a trailing slash
    pub api_url: String,
    /// Bearer token
    pub api_token: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config for a specific endpoint
    pub fn new(api_url: &str) -> Self {
        ApiConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            ..ApiConfig::default()
        }
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: &str) -> Self {
        self.api_token = token.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Build from a persisted configuration, then apply `OUTLYER_API_URL`
    /// and `OUTLYER_API_TOKEN` if set.
    pub fn from_cli_config(cli: &CliConfig) -> Self {
        let config = ApiConfig::default().with_token(&cli.api_token);
        config.with_env_overrides(
            std::env::var("OUTLYER_API_URL").ok(),
            std::env::var("OUTLYER_API_TOKEN").ok(),
        )
    }

    fn with_env_overrides(mut self, api_url: Option<String>, api_token: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.is_empty()) {
            self.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(token) = api_token.filter(|t| !t.is_empty()) {
            self.api_token = token;
        }
        self
    }

    /// Full URL for an API path such as `/accounts`
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_url, path)
        } else {
            format!("{}/{}", self.api_url, path)
        }
    }
}
