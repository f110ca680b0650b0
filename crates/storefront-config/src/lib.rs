#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Client configuration loaded from the environment.
//!
//! # Design
//! - Every setting has a default; only malformed values are errors.
//! - Loading goes through a lookup function so tests never touch the process
//!   environment.
//! - Blank values are treated as unset.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// API base URL.
pub const ENV_API_URL: &str = "STOREFRONT_API_URL";
/// Static bearer token.
pub const ENV_ACCESS_TOKEN: &str = "STOREFRONT_ACCESS_TOKEN";
/// Per-request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "STOREFRONT_TIMEOUT_SECS";
/// User-Agent header.
pub const ENV_USER_AGENT: &str = "STOREFRONT_USER_AGENT";
/// Default log filter.
pub const ENV_LOG_LEVEL: &str = "STOREFRONT_LOG_LEVEL";
/// JSON log toggle.
pub const ENV_LOG_JSON: &str = "STOREFRONT_LOG_JSON";

/// Base URL used when none is configured.
pub const DEFAULT_API_URL: &str = "https://api.polar.sh";
/// Timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Log level used when none is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was set to a value that cannot be used.
    #[error("invalid value for {field}: {reason}")]
    InvalidField {
        /// Variable name.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// Settings needed to talk to the API.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every request path is appended to.
    pub api_url: Url,
    /// Static bearer token; `None` sends anonymous requests.
    pub access_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
    /// Default log filter.
    pub log_level: String,
    /// Explicit JSON log toggle; `None` lets the build profile decide.
    pub log_json: Option<bool>,
}

impl Debug for ClientConfig {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("api_url", &self.api_url.as_str())
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl ClientConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for malformed values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for malformed values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_url = parse_url(
            ENV_API_URL,
            read(ENV_API_URL).as_deref().unwrap_or(DEFAULT_API_URL),
        )?;
        let timeout = parse_timeout(ENV_TIMEOUT_SECS, read(ENV_TIMEOUT_SECS).as_deref())?;
        let config = Self {
            api_url,
            access_token: read(ENV_ACCESS_TOKEN),
            timeout,
            user_agent: read(ENV_USER_AGENT).unwrap_or_else(default_user_agent),
            log_level: read(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_json: read(ENV_LOG_JSON).map(|value| env_flag_value(Some(&value))),
        };
        tracing::debug!(config = ?config, "client configuration loaded");
        Ok(config)
    }
}

/// Interpret a truthy flag (`1`, `true`, `yes`, `on`, case-insensitive).
#[must_use]
pub fn env_flag_value(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

/// `storefront/<crate version>`.
#[must_use]
pub fn default_user_agent() -> String {
    format!("storefront/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|_| ConfigError::InvalidField {
        field,
        value: value.to_string(),
        reason: "must be an absolute URL",
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidField {
            field,
            value: value.to_string(),
            reason: "scheme must be http or https",
        });
    }
    Ok(url)
}

fn parse_timeout(field: &'static str, value: Option<&str>) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(DEFAULT_TIMEOUT);
    };
    let secs = value.parse::<u64>().map_err(|_| ConfigError::InvalidField {
        field,
        value: value.to_string(),
        reason: "must be a whole number of seconds",
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidField {
            field,
            value: value.to_string(),
            reason: "must be greater than zero",
        });
    }
    Ok(Duration::from_secs(secs))
}
