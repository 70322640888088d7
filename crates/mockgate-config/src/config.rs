// crates/mockgate-config/src/config.rs
// ============================================================================
// Module: Mockgate Configuration
// Description: Configuration loading and validation for Mockgate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional and falls back to defaults; unknown keys are
//! rejected so typos fail loudly instead of silently using defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "mockgate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "MOCKGATE_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum worker pool size.
pub const MAX_ACTION_HANDLER_THREADS: usize = 256;
/// Maximum length of the proxy authentication realm.
pub const MAX_REALM_LENGTH: usize = 256;
/// Default proxy authentication realm.
pub const DEFAULT_PROXY_REALM: &str = "Mockgate HTTP Proxy";
/// Default socket connect timeout in milliseconds.
pub const DEFAULT_SOCKET_CONNECTION_TIMEOUT_MS: u64 = 20_000;
/// Default connect timeout for opportunistic proxy attempts in milliseconds.
pub const DEFAULT_OPPORTUNISTIC_PROXY_CONNECT_TIMEOUT_MS: u64 = 1_000;
/// Default bounded wait on a forwarded response in milliseconds.
pub const DEFAULT_MAX_FUTURE_TIMEOUT_MS: u64 = 90_000;
/// Default worker pool size.
pub const DEFAULT_ACTION_HANDLER_THREADS: usize = 5;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Mockgate dispatch configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockgateConfig {
    /// CORS preflight handling.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Transparent proxying and proxy authentication.
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Connect and wait timeouts.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Worker pool sizing.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl MockgateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.proxy.validate()?;
        self.timeouts.validate()?;
        self.scheduler.validate()?;
        Ok(())
    }
}

/// CORS preflight configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Answer preflight requests aimed at the control API.
    #[serde(default)]
    pub enable_for_api: bool,
    /// Answer preflight requests for every unmatched request.
    #[serde(default)]
    pub enable_for_all_responses: bool,
}

impl CorsConfig {
    /// Returns true when any CORS preflight handling is enabled.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enable_for_api || self.enable_for_all_responses
    }
}

/// Transparent proxy configuration.
///
/// # Invariants
/// - `authentication_username` and `authentication_password` are set together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    /// Forward unmatched requests whose `Host` names a third party.
    #[serde(default = "default_attempt_to_proxy")]
    pub attempt_to_proxy_if_no_matching_expectation: bool,
    /// Username required from opportunistically proxied requests.
    #[serde(default)]
    pub authentication_username: Option<String>,
    /// Password required from opportunistically proxied requests.
    #[serde(default)]
    pub authentication_password: Option<String>,
    /// Realm advertised in `Proxy-Authenticate` challenges.
    #[serde(default = "default_realm")]
    pub authentication_realm: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            attempt_to_proxy_if_no_matching_expectation: default_attempt_to_proxy(),
            authentication_username: None,
            authentication_password: None,
            authentication_realm: default_realm(),
        }
    }
}

impl ProxyConfig {
    /// Returns the configured credentials when proxy authentication is enabled.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.authentication_username, &self.authentication_password) {
            (Some(username), Some(password)) => Some((username, password)),
            _ => None,
        }
    }

    /// Validates proxy settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.authentication_username, &self.authentication_password) {
            (Some(username), Some(_)) if username.is_empty() => {
                return Err(ConfigError::Invalid(
                    "proxy.authentication_username must be non-empty".to_string(),
                ));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(ConfigError::Invalid(
                    "proxy.authentication_username and proxy.authentication_password must be set \
                     together"
                        .to_string(),
                ));
            }
            _ => {}
        }
        if self.authentication_realm.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "proxy.authentication_realm must be non-empty".to_string(),
            ));
        }
        if self.authentication_realm.len() > MAX_REALM_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "proxy.authentication_realm exceeds {MAX_REALM_LENGTH} characters"
            )));
        }
        Ok(())
    }
}

/// Timeout configuration in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Connect timeout for explicit forwards and proxying.
    #[serde(default = "default_socket_connection_timeout_ms")]
    pub socket_connection_timeout_ms: u64,
    /// Connect timeout for opportunistic proxy attempts.
    #[serde(default = "default_opportunistic_proxy_connect_timeout_ms")]
    pub opportunistic_proxy_connect_timeout_ms: u64,
    /// Bounded wait on a forwarded response.
    #[serde(default = "default_max_future_timeout_ms")]
    pub max_future_timeout_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            socket_connection_timeout_ms: default_socket_connection_timeout_ms(),
            opportunistic_proxy_connect_timeout_ms: default_opportunistic_proxy_connect_timeout_ms(
            ),
            max_future_timeout_ms: default_max_future_timeout_ms(),
        }
    }
}

impl TimeoutConfig {
    /// Returns the default socket connect timeout.
    #[must_use]
    pub const fn socket_connection_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_connection_timeout_ms)
    }

    /// Returns the opportunistic proxy connect timeout.
    #[must_use]
    pub const fn opportunistic_proxy_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.opportunistic_proxy_connect_timeout_ms)
    }

    /// Returns the bounded wait on a forwarded response.
    #[must_use]
    pub const fn max_future_timeout(&self) -> Duration {
        Duration::from_millis(self.max_future_timeout_ms)
    }

    /// Validates timeout values.
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("timeouts.socket_connection_timeout_ms", self.socket_connection_timeout_ms),
            (
                "timeouts.opportunistic_proxy_connect_timeout_ms",
                self.opportunistic_proxy_connect_timeout_ms,
            ),
            ("timeouts.max_future_timeout_ms", self.max_future_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{field} must be greater than zero")));
            }
        }
        Ok(())
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Number of threads running dispatched actions.
    #[serde(default = "default_action_handler_thread_count")]
    pub action_handler_thread_count: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            action_handler_thread_count: default_action_handler_thread_count(),
        }
    }
}

impl SchedulerConfig {
    /// Validates worker pool sizing.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.action_handler_thread_count == 0
            || self.action_handler_thread_count > MAX_ACTION_HANDLER_THREADS
        {
            return Err(ConfigError::Invalid(format!(
                "scheduler.action_handler_thread_count must be between 1 and \
                 {MAX_ACTION_HANDLER_THREADS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Default for `proxy.attempt_to_proxy_if_no_matching_expectation`.
const fn default_attempt_to_proxy() -> bool {
    true
}

/// Default for `proxy.authentication_realm`.
fn default_realm() -> String {
    DEFAULT_PROXY_REALM.to_string()
}

/// Default for `timeouts.socket_connection_timeout_ms`.
const fn default_socket_connection_timeout_ms() -> u64 {
    DEFAULT_SOCKET_CONNECTION_TIMEOUT_MS
}

/// Default for `timeouts.opportunistic_proxy_connect_timeout_ms`.
const fn default_opportunistic_proxy_connect_timeout_ms() -> u64 {
    DEFAULT_OPPORTUNISTIC_PROXY_CONNECT_TIMEOUT_MS
}

/// Default for `timeouts.max_future_timeout_ms`.
const fn default_max_future_timeout_ms() -> u64 {
    DEFAULT_MAX_FUTURE_TIMEOUT_MS
}

/// Default for `scheduler.action_handler_thread_count`.
const fn default_action_handler_thread_count() -> usize {
    DEFAULT_ACTION_HANDLER_THREADS
}
