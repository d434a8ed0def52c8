// crates/repost-conformance-runner/src/config/env_tests.rs
// ============================================================================
// Module: Harness Env Unit Tests
// Description: Unit coverage for strict environment parsing.
// Purpose: Ensure configuration parsing fails closed on invalid inputs.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Unit coverage for strict environment parsing.
//! Invariants:
//! - Environment parsing rejects invalid or empty values.
//! - Tests restore environment state after each run.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::sync::Mutex;
use std::sync::OnceLock;
use std::time::Duration;

use super::ConfigError;
use super::DEFAULT_TIMEOUT;
use super::HarnessConfig;
use super::HarnessEnv;
use super::LogFormat;
use super::validate_base_url;
use crate::endpoint::TrailingSlashPolicy;

mod env_mut {
    #![allow(unsafe_code, reason = "Tests mutate process env vars in a controlled scope.")]

    /// Sets an environment variable for the current process.
    pub fn set_var(key: &str, value: &str) {
        // SAFETY: Tests serialize environment mutation via a global lock.
        unsafe {
            std::env::set_var(key, value);
        }
    }

    /// Removes an environment variable from the current process.
    pub fn remove_var(key: &str) {
        // SAFETY: Tests serialize environment mutation via a global lock.
        unsafe {
            std::env::remove_var(key);
        }
    }
}

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().expect("env lock poisoned")
}

struct EnvGuard {
    entries: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    fn new(names: &[&'static str]) -> Self {
        let entries = names.iter().map(|name| (*name, std::env::var(*name).ok())).collect();
        for name in names {
            env_mut::remove_var(name);
        }
        Self {
            entries,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in self.entries.drain(..) {
            match value {
                Some(value) => env_mut::set_var(name, &value),
                None => env_mut::remove_var(name),
            }
        }
    }
}

fn env_names() -> [&'static str; 7] {
    [
        HarnessEnv::BaseUrl.as_str(),
        HarnessEnv::ApiPrefix.as_str(),
        HarnessEnv::TimeoutSeconds.as_str(),
        HarnessEnv::Seed.as_str(),
        HarnessEnv::TrailingSlash.as_str(),
        HarnessEnv::FollowRedirects.as_str(),
        HarnessEnv::LogFormat.as_str(),
    ]
}

#[test]
fn unset_environment_yields_defaults() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&env_names());

    let config = HarnessConfig::load().expect("config should load");
    assert_eq!(config, HarnessConfig::default());
    assert_eq!(config.api_prefix, "/api");
    assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    assert!(config.follow_redirects);
    assert_eq!(config.require_base_url(), Err(ConfigError::MissingBaseUrl));
}

#[test]
fn timeout_rejects_invalid_values() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&env_names());

    env_mut::set_var(HarnessEnv::TimeoutSeconds.as_str(), "0");
    assert!(HarnessConfig::load().is_err());

    env_mut::set_var(HarnessEnv::TimeoutSeconds.as_str(), "not-a-number");
    assert!(HarnessConfig::load().is_err());

    env_mut::set_var(HarnessEnv::TimeoutSeconds.as_str(), "   ");
    assert!(HarnessConfig::load().is_err());
}

#[test]
fn timeout_accepts_positive_values() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&env_names());

    env_mut::set_var(HarnessEnv::TimeoutSeconds.as_str(), "5");
    let config = HarnessConfig::load().expect("config should load");
    assert_eq!(config.timeout, Duration::from_secs(5));
}

#[test]
fn base_url_is_validated_and_normalized() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&env_names());

    env_mut::set_var(HarnessEnv::BaseUrl.as_str(), "http://localhost:8000/");
    let config = HarnessConfig::load().expect("config should load");
    assert_eq!(config.require_base_url(), Ok("http://localhost:8000"));

    env_mut::set_var(HarnessEnv::BaseUrl.as_str(), "ftp://localhost");
    assert!(matches!(HarnessConfig::load(), Err(ConfigError::InvalidBaseUrl { .. })));

    env_mut::set_var(HarnessEnv::BaseUrl.as_str(), "not a url");
    assert!(HarnessConfig::load().is_err());
}

#[test]
fn base_url_rejects_query_and_fragment() {
    assert!(validate_base_url("http://localhost:8000?debug=1").is_err());
    assert!(validate_base_url("http://localhost:8000#top").is_err());
    assert_eq!(validate_base_url(" https://repost.example ").unwrap(), "https://repost.example");
}

#[test]
fn enumerated_values_parse() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&env_names());

    env_mut::set_var(HarnessEnv::TrailingSlash.as_str(), "never");
    env_mut::set_var(HarnessEnv::LogFormat.as_str(), "JSON");
    env_mut::set_var(HarnessEnv::FollowRedirects.as_str(), "0");
    env_mut::set_var(HarnessEnv::Seed.as_str(), "42");
    let config = HarnessConfig::load().expect("config should load");
    assert_eq!(config.trailing_slash, TrailingSlashPolicy::Never);
    assert_eq!(config.log_format, LogFormat::Json);
    assert!(!config.follow_redirects);
    assert_eq!(config.seed, Some(42));
}

#[test]
fn enumerated_values_reject_unknown_labels() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&env_names());

    env_mut::set_var(HarnessEnv::TrailingSlash.as_str(), "sometimes");
    assert!(HarnessConfig::load().is_err());
    env_mut::remove_var(HarnessEnv::TrailingSlash.as_str());

    env_mut::set_var(HarnessEnv::FollowRedirects.as_str(), "maybe");
    assert!(HarnessConfig::load().is_err());
    env_mut::remove_var(HarnessEnv::FollowRedirects.as_str());

    env_mut::set_var(HarnessEnv::Seed.as_str(), "-1");
    assert!(HarnessConfig::load().is_err());
}

#[test]
fn empty_values_fail_closed() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&env_names());

    env_mut::set_var(HarnessEnv::LogFormat.as_str(), "");
    assert_eq!(
        HarnessConfig::load(),
        Err(ConfigError::Empty(HarnessEnv::LogFormat.as_str()))
    );
}

#[test]
fn empty_api_prefix_means_no_prefix() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&env_names());

    env_mut::set_var(HarnessEnv::ApiPrefix.as_str(), "");
    let config = HarnessConfig::load().expect("config should load");
    assert_eq!(config.api_prefix, "");
}
