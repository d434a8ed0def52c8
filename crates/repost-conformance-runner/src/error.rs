// crates/repost-conformance-runner/src/error.rs
// ============================================================================
// Module: Harness Errors
// Description: Fatal assertion and transport failures of a conformance run.
// Purpose: Carry enough context to diagnose a failing server from one line.
// Dependencies: repost-conformance-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every failure is fatal: the first error aborts the run and is reported by
//! the caller. Assertion variants render the request, the observed response,
//! and the expected state.

use repost_conformance_core::EntityError;
use serde_json::Value;
use thiserror::Error;

use crate::config::ConfigError;
use crate::endpoint::HttpMethod;
use crate::transport::TransportError;
use crate::votes::VoteRejected;

/// Result alias for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Fatal harness failures.
///
/// # Invariants
/// - Display output is the operator-facing diagnostic.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The server answered with a status other than the expected one.
    #[error("{method} {path}\nGot status code {actual}\nExpected {expected}\nResponse: {body}")]
    UnexpectedStatus {
        /// Request method.
        method: HttpMethod,
        /// Rendered endpoint path.
        path: String,
        /// Observed status.
        actual: u16,
        /// Expected status.
        expected: u16,
        /// Raw response body.
        body: String,
    },
    /// The response body did not match the expected entity state.
    #[error("{method} {path}\nResponse does not match expected {kind}\nGot: {actual}\nExpected: {expected}")]
    EntityMismatch {
        /// Request method.
        method: HttpMethod,
        /// Rendered endpoint path.
        path: String,
        /// Entity kind label.
        kind: &'static str,
        /// Parsed response body.
        actual: Value,
        /// Expected entity snapshot.
        expected: Value,
    },
    /// The response body was not valid JSON.
    #[error("{method} {path}\nResponse is not valid JSON ({message})\nResponse: {body}")]
    InvalidJson {
        /// Request method.
        method: HttpMethod,
        /// Rendered endpoint path.
        path: String,
        /// Parser error text.
        message: String,
        /// Raw response body.
        body: String,
    },
    /// A listing endpoint did not return a JSON array.
    #[error("GET {path}\nExpected a JSON array\nGot: {actual}")]
    NotAList {
        /// Rendered endpoint path.
        path: String,
        /// Parsed response body, `null` when there was none.
        actual: Value,
    },
    /// An entity expected in a listing was absent.
    #[error("GET {path}\n{kind} missing from listing\nExpected: {expected}")]
    MissingFromListing {
        /// Rendered endpoint path.
        path: String,
        /// Entity kind label.
        kind: &'static str,
        /// Expected entity snapshot.
        expected: Value,
    },
    /// An entity expected to be gone was still listed.
    #[error("GET {path}\n{kind} still listed\nUnexpected: {expected}")]
    StillListed {
        /// Rendered endpoint path.
        path: String,
        /// Entity kind label.
        kind: &'static str,
        /// Entity snapshot that should be absent.
        expected: Value,
    },
    /// Two submissions of the same content were assigned one identifier.
    #[error("duplicate {kind} submission reused id {id}")]
    DuplicateIdentity {
        /// Entity kind label.
        kind: &'static str,
        /// Reused identifier.
        id: u64,
    },
    /// The login response carried no usable access token.
    #[error("POST {path}\nLogin response has no access_token\nResponse: {body}")]
    MissingAccessToken {
        /// Rendered endpoint path.
        path: String,
        /// Response body as received.
        body: String,
    },
    /// The vote ledger disagrees with the fixed vote table.
    #[error("vote step {step}: ledger total {ledger} disagrees with table total {table}")]
    VoteModel {
        /// Zero-based step index.
        step: usize,
        /// Total computed by the ledger.
        ledger: i64,
        /// Total listed in the vote table.
        table: i64,
    },
    /// The vote model refused a value from the fixed sequence.
    #[error(transparent)]
    Vote(#[from] VoteRejected),
    /// The run configuration is incomplete.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The HTTP round-trip failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A local entity operation failed.
    #[error(transparent)]
    Entity(#[from] EntityError),
}

/// A repeated run stopped by its first failing run.
#[derive(Debug, Error)]
#[error("Run {number} failed\n{source}")]
pub struct RunFailure {
    /// One-based number of the failing run.
    pub number: u32,
    /// Error that ended the run.
    pub source: HarnessError,
}
