//! Runtime configuration.
//!
//! Values arrive from command-line flags (with environment fallbacks, see
//! `main.rs`) and are validated here into typed settings. Timeouts are
//! tuning knobs read straight from the environment.

use std::time::Duration;

pub const DEFAULT_THROTTLE_MS: u64 = 40;
pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signUp";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
/// Log level used when `OFFICE_MOVER_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown backend '{0}' (expected 'memory' or 'rest')")]
    UnknownBackend(String),
    #[error("the rest backend requires OFFICE_MOVER_DATABASE_URL")]
    MissingDatabaseUrl,
    #[error("database URL must start with http:// or https://, got '{0}'")]
    InvalidDatabaseUrl(String),
    #[error("throttle interval must be greater than zero")]
    ZeroThrottle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl RestTimeouts {
    /// Read `OFFICE_MOVER_REQUEST_TIMEOUT_SECS` and `OFFICE_MOVER_CONNECT_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            request_secs: env_parse("OFFICE_MOVER_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("OFFICE_MOVER_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    pub database_url: String,
    pub api_key: Option<String>,
    pub auth_url: String,
    pub timeouts: RestTimeouts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Memory,
    Rest(RestConfig),
}

impl BackendConfig {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Rest(_) => "rest",
        }
    }
}

/// Raw settings as collected from flags and environment.
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    pub backend: Option<String>,
    pub database_url: Option<String>,
    pub api_key: Option<String>,
    pub auth_url: Option<String>,
    pub throttle_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficeConfig {
    pub backend: BackendConfig,
    /// How often pending furniture updates are pushed.
    pub throttle: Duration,
}

impl OfficeConfig {
    /// Validate raw settings.
    ///
    /// - `backend`: `memory` (default) or `rest`
    /// - `database_url`: required for `rest`, http(s) only
    /// - `api_key`: used for anonymous sign-in against `auth_url`
    /// - `throttle_ms`: default 40, must be non-zero
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first invalid setting.
    pub fn from_raw(raw: RawConfig, timeouts: RestTimeouts) -> Result<Self, ConfigError> {
        let throttle_ms = raw.throttle_ms.unwrap_or(DEFAULT_THROTTLE_MS);
        if throttle_ms == 0 {
            return Err(ConfigError::ZeroThrottle);
        }

        let backend = match raw.backend.as_deref().unwrap_or("memory") {
            "memory" => BackendConfig::Memory,
            "rest" => {
                let database_url = raw
                    .database_url
                    .filter(|url| !url.trim().is_empty())
                    .ok_or(ConfigError::MissingDatabaseUrl)?;
                if !(database_url.starts_with("https://") || database_url.starts_with("http://")) {
                    return Err(ConfigError::InvalidDatabaseUrl(database_url));
                }
                BackendConfig::Rest(RestConfig {
                    database_url: database_url.trim_end_matches('/').to_string(),
                    api_key: raw.api_key.filter(|key| !key.is_empty()),
                    auth_url: raw.auth_url.unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
                    timeouts,
                })
            }
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        Ok(Self { backend, throttle: Duration::from_millis(throttle_ms) })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
