// crates/repost-conformance-runner/src/lib.rs
// ============================================================================
// Module: Repost Conformance Runner Library
// Description: Request tester, vote tester, and scenario driver.
// Purpose: Drive a live Repost API and assert its observable contract.
// Dependencies: repost-conformance-core, reqwest, serde, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! The runner executes one deterministic, sequential script against a Repost
//! server. Every request flows through [`RequestTester`], which adds the
//! missing- and malformed-credential probes to authenticated cases, asserts
//! exact statuses, and compares bodies against entity mirrors from
//! `repost-conformance-core`. [`Transport`] is the only I/O boundary.
//! Invariants:
//! - The first failure aborts the run; there are no retries.
//! - Per-run state lives in an explicit [`HarnessContext`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod config;
pub mod context;
pub mod contract;
pub mod endpoint;
pub mod error;
pub mod log;
pub mod report;
pub mod run;
pub mod scenario;
pub mod tester;
pub mod transport;
pub mod votes;

#[cfg(test)]
mod tests;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auth::AccessToken;
pub use config::ConfigError;
pub use config::HarnessConfig;
pub use config::LogFormat;
pub use context::HarnessContext;
pub use endpoint::Endpoint;
pub use endpoint::EndpointResolver;
pub use endpoint::HttpMethod;
pub use endpoint::TrailingSlashPolicy;
pub use error::HarnessError;
pub use error::HarnessResult;
pub use error::RunFailure;
pub use log::MemoryRunLog;
pub use log::RunEvent;
pub use log::RunLog;
pub use report::MultiRunSummary;
pub use report::RunSummary;
pub use run::run_many;
pub use run::run_once;
pub use tester::RequestTester;
pub use tester::TestCase;
pub use transport::HttpTransport;
pub use transport::RequestBody;
pub use transport::Transport;
pub use transport::TransportError;
pub use transport::TransportRequest;
pub use transport::TransportResponse;
