// crates/repost-conformance-runner/src/config/env.rs
// ============================================================================
// Module: Harness Environment
// Description: Environment-backed configuration for conformance runs.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: thiserror, url
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8, empty values, and unparseable values fail
//! closed. Command-line flags are applied on top of the loaded values by the
//! caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::contract::DEFAULT_API_PREFIX;
use crate::endpoint::TrailingSlashPolicy;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment keys for harness configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessEnv {
    /// Server base URL (`http` or `https`).
    BaseUrl,
    /// API path prefix appended to the base URL.
    ApiPrefix,
    /// Per-request timeout in seconds (positive integer).
    TimeoutSeconds,
    /// Seed for random usernames and content.
    Seed,
    /// Trailing-slash policy (`declared` or `never`).
    TrailingSlash,
    /// Follow HTTP redirects (`true`/`false` or `1`/`0`).
    FollowRedirects,
    /// Run log format (`text`, `json`, or `off`).
    LogFormat,
}

impl HarnessEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BaseUrl => "REPOST_CONFORMANCE_BASE_URL",
            Self::ApiPrefix => "REPOST_CONFORMANCE_API_PREFIX",
            Self::TimeoutSeconds => "REPOST_CONFORMANCE_TIMEOUT_SEC",
            Self::Seed => "REPOST_CONFORMANCE_SEED",
            Self::TrailingSlash => "REPOST_CONFORMANCE_TRAILING_SLASH",
            Self::FollowRedirects => "REPOST_CONFORMANCE_FOLLOW_REDIRECTS",
            Self::LogFormat => "REPOST_CONFORMANCE_LOG_FORMAT",
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable was not valid UTF-8.
    #[error("{0} must be valid UTF-8")]
    NotUtf8(&'static str),
    /// A variable was set but blank.
    #[error("{0} must not be empty")]
    Empty(&'static str),
    /// A value failed validation.
    #[error("{name} {expected}")]
    Invalid {
        /// Variable or flag name.
        name: &'static str,
        /// Description of an accepted value.
        expected: &'static str,
    },
    /// No base URL was configured.
    #[error("a base URL is required (argument or {})", HarnessEnv::BaseUrl.as_str())]
    MissingBaseUrl,
    /// The base URL could not be used.
    #[error("invalid base URL {value}: {message}")]
    InvalidBaseUrl {
        /// Rejected value.
        value: String,
        /// Reason.
        message: String,
    },
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Run log rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable progress lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
    /// No run log.
    Off,
}

impl LogFormat {
    /// Parses a format label.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

/// Typed harness configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Validated server base URL, once known.
    pub base_url: Option<String>,
    /// API path prefix.
    pub api_prefix: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Base seed; `None` draws from OS entropy per run.
    pub seed: Option<u64>,
    /// Trailing-slash policy.
    pub trailing_slash: TrailingSlashPolicy,
    /// Follow HTTP redirects.
    pub follow_redirects: bool,
    /// Run log rendering.
    pub log_format: LogFormat,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            timeout: DEFAULT_TIMEOUT,
            seed: None,
            trailing_slash: TrailingSlashPolicy::Declared,
            follow_redirects: true,
            log_format: LogFormat::Text,
        }
    }
}

impl HarnessConfig {
    /// Loads configuration from environment variables over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value is not valid UTF-8, is empty, or
    /// fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let base_url = read_env_nonempty(HarnessEnv::BaseUrl.as_str())?
            .map(|value| validate_base_url(&value))
            .transpose()?;
        let api_prefix =
            read_env_strict(HarnessEnv::ApiPrefix.as_str())?.unwrap_or(defaults.api_prefix);
        let timeout = read_env_nonempty(HarnessEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(HarnessEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?
            .unwrap_or(defaults.timeout);
        let seed = read_env_nonempty(HarnessEnv::Seed.as_str())?
            .map(|value| parse_seed(HarnessEnv::Seed.as_str(), &value))
            .transpose()?;
        let trailing_slash = read_env_nonempty(HarnessEnv::TrailingSlash.as_str())?
            .map(|value| {
                TrailingSlashPolicy::parse(&value).ok_or(ConfigError::Invalid {
                    name: HarnessEnv::TrailingSlash.as_str(),
                    expected: "must be declared or never",
                })
            })
            .transpose()?
            .unwrap_or(defaults.trailing_slash);
        let follow_redirects = parse_bool_env(
            HarnessEnv::FollowRedirects.as_str(),
            read_env_nonempty(HarnessEnv::FollowRedirects.as_str())?,
            defaults.follow_redirects,
        )?;
        let log_format = read_env_nonempty(HarnessEnv::LogFormat.as_str())?
            .map(|value| {
                LogFormat::parse(&value).ok_or(ConfigError::Invalid {
                    name: HarnessEnv::LogFormat.as_str(),
                    expected: "must be text, json, or off",
                })
            })
            .transpose()?
            .unwrap_or(defaults.log_format);
        Ok(Self {
            base_url,
            api_prefix,
            timeout,
            seed,
            trailing_slash,
            follow_redirects,
            log_format,
        })
    }

    /// Returns the base URL or an error when none was configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingBaseUrl`] when unset.
    pub fn require_base_url(&self) -> Result<&str, ConfigError> {
        self.base_url.as_deref().ok_or(ConfigError::MissingBaseUrl)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates an `http`/`https` base URL and strips trailing slashes.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBaseUrl`] for unparseable URLs, other
/// schemes, or URLs carrying a query or fragment.
pub fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let invalid = |message: &str| ConfigError::InvalidBaseUrl {
        value: trimmed.to_string(),
        message: message.to_string(),
    };
    let url = Url::parse(trimmed).map_err(|err| invalid(&err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed"));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns [`ConfigError::NotUtf8`] when the variable contains invalid UTF-8.
pub fn read_env_strict(name: &'static str) -> Result<Option<String>, ConfigError> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| ConfigError::NotUtf8(name))
    })
}

/// Reads an environment variable and rejects empty values.
fn read_env_nonempty(name: &'static str) -> Result<Option<String>, ConfigError> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(name)),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Parses a positive timeout value in whole seconds.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the value is non-numeric or zero.
pub fn parse_timeout_seconds(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        expected: "must be a positive integer number of seconds",
    })?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            expected: "must be greater than zero",
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Parses an unsigned seed.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the value is not an unsigned integer.
pub fn parse_seed(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        expected: "must be an unsigned integer",
    })
}

/// Parses a boolean environment variable, falling back to `default`.
fn parse_bool_env(
    name: &'static str,
    raw: Option<String>,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        return Ok(false);
    }
    Err(ConfigError::Invalid {
        name,
        expected: "must be 1, 0, true, or false",
    })
}
