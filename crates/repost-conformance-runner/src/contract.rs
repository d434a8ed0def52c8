// crates/repost-conformance-runner/src/contract.rs
// ============================================================================
// Module: API Contract Constants
// Description: Status codes and literals the harness treats as contract.
// Purpose: Pin ambiguous server behaviors to named, reviewable constants.
// Dependencies: reqwest
// ============================================================================

//! ## Overview
//! Statuses the Repost API must return for cross-cutting situations. Values
//! that have differed between server revisions are fixed here once rather
//! than guessed at each call site.

use std::ops::RangeInclusive;

use reqwest::StatusCode;

/// Bearer token that is syntactically invalid for every server.
pub const MALFORMED_TOKEN: &str = "not.a.token";

/// Status for an authenticated endpoint called without credentials.
pub const MISSING_TOKEN_STATUS: StatusCode = StatusCode::UNAUTHORIZED;

/// Status for an authenticated endpoint called with [`MALFORMED_TOKEN`].
pub const MALFORMED_TOKEN_STATUS: StatusCode = StatusCode::UNAUTHORIZED;

/// Status for a login with an unknown user or a wrong password.
pub const LOGIN_REJECTED_STATUS: StatusCode = StatusCode::UNAUTHORIZED;

/// Status for a successful vote submission.
pub const VOTE_ACCEPTED_STATUS: StatusCode = StatusCode::OK;

/// Status for a successful deletion.
pub const DELETED_STATUS: StatusCode = StatusCode::OK;

/// OAuth2 password-flow grant type sent on login.
pub const LOGIN_GRANT_TYPE: &str = "password";

/// OAuth2 client identifier sent on login.
pub const LOGIN_CLIENT_ID: &str = "repost";

/// OAuth2 scope requested on login.
pub const LOGIN_SCOPE: &str = "user";

/// Identifier assumed never to exist on the server.
pub const NONEXISTENT_ID: u64 = 9_999_999_999;

/// Vote values accepted by the vote endpoints.
pub const VOTE_RANGE: RangeInclusive<i64> = -1 ..= 1;

/// Default API path prefix appended to the base URL.
pub const DEFAULT_API_PREFIX: &str = "/api";

/// Status for a token whose user has since been deleted.
pub const REVOKED_TOKEN_STATUS: StatusCode = StatusCode::UNAUTHORIZED;
