// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the service. Configuration is loaded from the environment once
//! at startup via [`Settings::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH_SERVICE_URL` | Base URL of the remote token authority | Required |
//! | `AUTH_SERVICE_TIMEOUT_SECS` | Timeout of one token validation call | `5` |
//! | `CACHE_TTL_SECS` | Lifetime of a cached user snapshot | `600` |
//! | `CACHE_CAPACITY` | Maximum number of cached snapshots | `10000` |
//! | `APP_PROFILE` | `dev` / `development` enables verbose operation logs | production |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::time::Duration;

/// Environment variable name for the token authority base URL.
///
/// Validation requests are POSTed to `<url>/api/v1/auth/validate`.
pub const AUTH_SERVICE_URL_ENV: &str = "AUTH_SERVICE_URL";

/// Environment variable name for the token authority call timeout (seconds).
pub const AUTH_SERVICE_TIMEOUT_ENV: &str = "AUTH_SERVICE_TIMEOUT_SECS";

/// Default token authority timeout (seconds).
pub const DEFAULT_AUTH_SERVICE_TIMEOUT_SECS: u64 = 5;

/// Environment variable name for the snapshot TTL (seconds).
pub const CACHE_TTL_ENV: &str = "CACHE_TTL_SECS";

/// Default snapshot TTL: 10 minutes.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Environment variable name for the snapshot cache capacity (entries).
pub const CACHE_CAPACITY_ENV: &str = "CACHE_CAPACITY";

/// Default snapshot cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Environment variable name for the deployment profile.
pub const APP_PROFILE_ENV: &str = "APP_PROFILE";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Configuration loading errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON lines, one event per line.
    Json,
    /// Human-readable multi-line output.
    #[default]
    Pretty,
}

/// How much detail the service operation log records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OperationLogging {
    /// Operation names, arguments and results.
    Development,
    /// Operation names and timings only.
    #[default]
    Production,
}

/// Service settings resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub auth_service_url: String,
    pub auth_service_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub operation_logging: OperationLogging,
    pub log_format: LogFormat,
}

impl Settings {
    /// Settings with defaults for everything except the authority URL.
    pub fn new(auth_service_url: impl Into<String>) -> Self {
        Self {
            auth_service_url: auth_service_url.into(),
            auth_service_timeout: Duration::from_secs(DEFAULT_AUTH_SERVICE_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            operation_logging: OperationLogging::default(),
            log_format: LogFormat::default(),
        }
    }

    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let auth_service_url = get(AUTH_SERVICE_URL_ENV)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .ok_or(ConfigError::Missing(AUTH_SERVICE_URL_ENV))?;

        let mut settings = Settings::new(auth_service_url);

        if let Some(value) = get(AUTH_SERVICE_TIMEOUT_ENV) {
            settings.auth_service_timeout =
                Duration::from_secs(parse_number(AUTH_SERVICE_TIMEOUT_ENV, &value)?);
        }
        if let Some(value) = get(CACHE_TTL_ENV) {
            settings.cache_ttl = Duration::from_secs(parse_number(CACHE_TTL_ENV, &value)?);
        }
        if let Some(value) = get(CACHE_CAPACITY_ENV) {
            settings.cache_capacity = parse_number(CACHE_CAPACITY_ENV, &value)?;
        }
        if let Some(value) = get(APP_PROFILE_ENV) {
            settings.operation_logging = operation_logging_for_profile(&value);
        }
        if let Some(value) = get(LOG_FORMAT_ENV) {
            settings.log_format = match value.trim().to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: LOG_FORMAT_ENV,
                        value,
                    })
                }
            };
        }

        Ok(settings)
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
    })
}

fn operation_logging_for_profile(profile: &str) -> OperationLogging {
    match profile.trim().to_lowercase().as_str() {
        "dev" | "development" => OperationLogging::Development,
        _ => OperationLogging::Production,
    }
}
