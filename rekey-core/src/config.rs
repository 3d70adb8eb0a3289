//! Configuration for recovery sessions

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{RecoveryError, RecoveryResult};

/// Recovery session configuration
///
/// The recovery service endpoint is required; the tenant endpoint is
/// only needed when signing is delegated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Recovery service base URL
    pub recovery_url: String,
    /// Tenant signing endpoint base URL, set when signing is delegated
    pub tenant_url: Option<String>,
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            recovery_url: String::new(),
            tenant_url: None,
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000, // 30 seconds
        }
    }
}

impl SessionConfig {
    /// Create configuration from file
    pub fn from_file(path: &Path) -> RecoveryResult<Self> {
        let config_str = std::fs::read_to_string(path).map_err(|e| {
            RecoveryError::InvalidConfiguration(format!("Failed to read config file: {}", e))
        })?;

        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&config_str).map_err(|e| {
                RecoveryError::InvalidConfiguration(format!("Failed to parse TOML config: {}", e))
            })
        } else {
            serde_json::from_str(&config_str).map_err(|e| {
                RecoveryError::InvalidConfiguration(format!("Failed to parse JSON config: {}", e))
            })
        }
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> RecoveryResult<()> {
        let config_str = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::to_string_pretty(self).map_err(|e| {
                RecoveryError::InvalidConfiguration(format!(
                    "Failed to serialize config as TOML: {}",
                    e
                ))
            })?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| {
                RecoveryError::InvalidConfiguration(format!(
                    "Failed to serialize config as JSON: {}",
                    e
                ))
            })?
        };

        std::fs::write(path, config_str).map_err(|e| {
            RecoveryError::InvalidConfiguration(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> RecoveryResult<()> {
        if self.recovery_url.trim().is_empty() {
            return Err(RecoveryError::MissingRecoveryEndpoint);
        }

        url::Url::parse(&self.recovery_url)
            .map_err(|e| RecoveryError::InvalidEndpoint(format!("recovery endpoint: {}", e)))?;

        if let Some(tenant_url) = &self.tenant_url {
            url::Url::parse(tenant_url)
                .map_err(|e| RecoveryError::InvalidEndpoint(format!("tenant endpoint: {}", e)))?;
        }

        if self.http.timeout_ms == 0 {
            return Err(RecoveryError::InvalidConfiguration(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
