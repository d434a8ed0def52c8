// crates/repost-conformance-runner/src/config/mod.rs
// ============================================================================
// Module: Harness Configuration
// Description: Centralized configuration for conformance runs.
// Purpose: Provide typed access to environment settings and defaults.
// Dependencies: thiserror, url
// ============================================================================

//! ## Overview
//! Run configuration is read from environment variables and mapped into a
//! small typed structure; the CLI overrides individual fields afterwards.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod env_tests;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::ConfigError;
pub use env::DEFAULT_TIMEOUT;
pub use env::HarnessConfig;
pub use env::HarnessEnv;
pub use env::LogFormat;
pub use env::parse_seed;
pub use env::parse_timeout_seconds;
pub use env::read_env_strict;
pub use env::validate_base_url;
