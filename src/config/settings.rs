//! Client settings, loadable from TOML files and environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::error::ConfigError;

// ============================================================================
// Default value functions
// ============================================================================

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_page_size() -> u32 {
    20
}

fn default_true() -> bool {
    true
}

fn default_stale_secs() -> u64 {
    300
}

fn default_max_entries() -> usize {
    1024
}

fn default_otp_poll_interval() -> u64 {
    5
}

fn default_token_path() -> PathBuf {
    PathBuf::from(".syndic-admin/token.json")
}

// ============================================================================
// API Configuration
// ============================================================================

/// Backend connectivity settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Backend origin; the `/api/admin` base path is appended by the
    /// transport.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Default page size for paginated listings
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            page_size: default_page_size(),
        }
    }
}

// ============================================================================
// Cache Configuration
// ============================================================================

/// Query cache behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds before a cached entry is considered stale
    #[serde(default = "default_stale_secs")]
    pub stale_secs: u64,

    /// Soft bound on the number of cached entries
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_secs: default_stale_secs(),
            max_entries: default_max_entries(),
        }
    }
}

// ============================================================================
// OTP Configuration
// ============================================================================

/// Pending-OTP polling behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpSettings {
    /// Seconds between polls of the destructive-read OTP listing
    #[serde(default = "default_otp_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_otp_poll_interval(),
        }
    }
}

// ============================================================================
// Top-level Settings
// ============================================================================

/// All client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub otp: OtpSettings,

    /// Location of the persisted bearer token
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
}

impl Settings {
    /// Checks that the loaded values can actually drive a client.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("api.base_url", "must not be empty"));
        }
        if Url::parse(&self.api.base_url).is_err() {
            return Err(ConfigError::invalid(
                "api.base_url",
                format!("'{}' is not a valid URL", self.api.base_url),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::invalid("api.timeout_secs", "must be positive"));
        }
        if self.api.connect_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "api.connect_timeout_secs",
                "must be positive",
            ));
        }
        if self.api.page_size == 0 {
            return Err(ConfigError::invalid("api.page_size", "must be positive"));
        }
        if self.otp.poll_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "otp.poll_interval_secs",
                "must be positive",
            ));
        }
        Ok(())
    }
}
