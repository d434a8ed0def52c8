// system-tests/src/lib.rs
// ============================================================================
// Module: Repost Conformance System Tests Library
// Description: Shared fixtures for end-to-end conformance runs.
// Purpose: Provide an in-process Repost server and harness configuration.
// Dependencies: repost-conformance-runner, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! This crate hosts the in-process Repost server used by the system-test
//! binaries in `system-tests/tests`, plus a helper that builds a harness
//! configuration pointed at it.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod fake_api;

// ============================================================================
// SECTION: Imports
// ============================================================================

use repost_conformance_runner::HarnessConfig;
use repost_conformance_runner::LogFormat;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Base URL the fake server answers on; never resolved.
pub const FAKE_BASE_URL: &str = "http://repost.test";

/// Quiet, seeded configuration aimed at [`FAKE_BASE_URL`].
#[must_use]
pub fn fake_config(seed: u64) -> HarnessConfig {
    HarnessConfig {
        base_url: Some(FAKE_BASE_URL.to_string()),
        seed: Some(seed),
        log_format: LogFormat::Off,
        ..HarnessConfig::default()
    }
}
