// crates/repost-conformance-runner/src/tester.rs
// ============================================================================
// Module: Request Tester
// Description: One-call assertion wrapper with automatic auth probes.
// Purpose: Turn every authenticated case into three checked executions.
// Dependencies: repost-conformance-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`RequestTester::test`] runs a [`TestCase`]: when the case carries a token
//! and does not opt out, the same request is first sent without credentials
//! and then with a malformed bearer token, each expecting 401. The primary
//! call then asserts the exact expected status, parses the body, and compares
//! it against an optional entity mirror.
//! Invariants:
//! - Probes never recurse; each is a single direct execution.
//! - Every execution, probes included, increments the executed counter.
//! - A compare target is mutated in place when it adopts server fields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use repost_conformance_core::CompareTarget;
use reqwest::StatusCode;
use serde_json::Value;

use crate::auth::AccessToken;
use crate::contract::MALFORMED_TOKEN;
use crate::contract::MALFORMED_TOKEN_STATUS;
use crate::contract::MISSING_TOKEN_STATUS;
use crate::endpoint::Endpoint;
use crate::endpoint::EndpointResolver;
use crate::endpoint::HttpMethod;
use crate::error::HarnessError;
use crate::error::HarnessResult;
use crate::log::CallKind;
use crate::log::RunEvent;
use crate::log::RunLog;
use crate::transport::RequestBody;
use crate::transport::Transport;
use crate::transport::TransportRequest;

// ============================================================================
// SECTION: Test Cases
// ============================================================================

/// One request with its expected outcome.
pub struct TestCase<'a> {
    /// HTTP method.
    pub method: HttpMethod,
    /// Target endpoint.
    pub endpoint: Endpoint,
    /// Credentials for the primary call.
    pub token: Option<&'a AccessToken>,
    /// Exact status expected from the primary call.
    pub expected: StatusCode,
    /// Entity mirror the response must match.
    pub compare_to: Option<&'a mut dyn CompareTarget>,
    /// Suppresses the missing/malformed token probes.
    pub skip_auth_probe: bool,
    /// Request body.
    pub body: RequestBody,
}

impl<'a> TestCase<'a> {
    /// Creates a case with no token, target, or body.
    #[must_use]
    pub const fn new(method: HttpMethod, endpoint: Endpoint, expected: StatusCode) -> Self {
        Self {
            method,
            endpoint,
            token: None,
            expected,
            compare_to: None,
            skip_auth_probe: false,
            body: RequestBody::Empty,
        }
    }

    /// GET case.
    #[must_use]
    pub const fn get(endpoint: Endpoint, expected: StatusCode) -> Self {
        Self::new(HttpMethod::Get, endpoint, expected)
    }

    /// POST case.
    #[must_use]
    pub const fn post(endpoint: Endpoint, expected: StatusCode) -> Self {
        Self::new(HttpMethod::Post, endpoint, expected)
    }

    /// PATCH case.
    #[must_use]
    pub const fn patch(endpoint: Endpoint, expected: StatusCode) -> Self {
        Self::new(HttpMethod::Patch, endpoint, expected)
    }

    /// DELETE case.
    #[must_use]
    pub const fn delete(endpoint: Endpoint, expected: StatusCode) -> Self {
        Self::new(HttpMethod::Delete, endpoint, expected)
    }

    /// Authenticates the primary call with `token`.
    #[must_use]
    pub const fn token(mut self, token: &'a AccessToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Compares the response against `target`, adopting server fields.
    #[must_use]
    pub fn compare(mut self, target: &'a mut dyn CompareTarget) -> Self {
        self.compare_to = Some(target);
        self
    }

    /// Sends `body` as JSON.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Sends an explicit body.
    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Disables the auth probes for this case.
    #[must_use]
    pub const fn skip_auth_probe(mut self) -> Self {
        self.skip_auth_probe = true;
        self
    }
}

/// Parameters of a single execution.
struct Execution<'b> {
    /// Primary call or probe.
    call: CallKind,
    /// HTTP method.
    method: HttpMethod,
    /// Rendered endpoint path.
    path: &'b str,
    /// Bearer credential to send, if any.
    bearer: Option<&'b str>,
    /// Status the execution must return.
    expected: StatusCode,
    /// Request body.
    body: &'b RequestBody,
}

// ============================================================================
// SECTION: Tester
// ============================================================================

/// Executes test cases over a transport.
pub struct RequestTester {
    /// HTTP boundary.
    transport: Box<dyn Transport>,
    /// URL builder.
    endpoints: EndpointResolver,
    /// Event sink.
    log: Arc<dyn RunLog>,
    /// Executions so far, probes included.
    executed: u64,
}

impl RequestTester {
    /// Creates a tester with a zeroed counter.
    #[must_use]
    pub fn new(
        transport: Box<dyn Transport>,
        endpoints: EndpointResolver,
        log: Arc<dyn RunLog>,
    ) -> Self {
        Self {
            transport,
            endpoints,
            log,
            executed: 0,
        }
    }

    /// Returns the number of executions so far.
    #[must_use]
    pub const fn executed(&self) -> u64 {
        self.executed
    }

    /// Returns the rendered path for `endpoint`.
    #[must_use]
    pub fn path(&self, endpoint: &Endpoint) -> String {
        self.endpoints.path(endpoint)
    }

    /// Runs `case`, probing auth first when it carries a token.
    ///
    /// Returns the parsed response body, or `None` for no-content responses.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] on the first status, parse, or comparison
    /// failure of any execution, or when the transport fails.
    pub fn test(&mut self, case: TestCase<'_>) -> HarnessResult<Option<Value>> {
        let TestCase {
            method,
            endpoint,
            token,
            expected,
            compare_to,
            skip_auth_probe,
            body,
        } = case;
        let path = self.endpoints.path(&endpoint);
        if token.is_some() && !skip_auth_probe {
            self.execute(
                &Execution {
                    call: CallKind::MissingToken,
                    method,
                    path: &path,
                    bearer: None,
                    expected: MISSING_TOKEN_STATUS,
                    body: &body,
                },
                None,
            )?;
            self.execute(
                &Execution {
                    call: CallKind::MalformedToken,
                    method,
                    path: &path,
                    bearer: Some(MALFORMED_TOKEN),
                    expected: MALFORMED_TOKEN_STATUS,
                    body: &body,
                },
                None,
            )?;
        }
        self.execute(
            &Execution {
                call: CallKind::Primary,
                method,
                path: &path,
                bearer: token.map(AccessToken::value),
                expected,
                body: &body,
            },
            compare_to,
        )
    }

    fn execute(
        &mut self,
        execution: &Execution<'_>,
        compare_to: Option<&mut dyn CompareTarget>,
    ) -> HarnessResult<Option<Value>> {
        let mut headers = BTreeMap::new();
        if let Some(bearer) = execution.bearer {
            headers.insert("Authorization".to_string(), format!("Bearer {bearer}"));
        }
        let request = TransportRequest {
            method: execution.method,
            url: self.endpoints.url(execution.path),
            headers,
            body: execution.body.clone(),
        };
        let started = Instant::now();
        let response = self.transport.call(&request)?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.executed += 1;

        if response.status != execution.expected {
            return Err(HarnessError::UnexpectedStatus {
                method: execution.method,
                path: execution.path.to_string(),
                actual: response.status.as_u16(),
                expected: execution.expected.as_u16(),
                body: response.body,
            });
        }
        self.log.record(&RunEvent::Request {
            sequence: self.executed,
            call: execution.call,
            method: execution.method,
            path: execution.path.to_string(),
            status: response.status.as_u16(),
            elapsed_ms,
        });

        if is_no_content(response.status, &response.body) {
            return Ok(None);
        }
        let value: Value =
            serde_json::from_str(&response.body).map_err(|err| HarnessError::InvalidJson {
                method: execution.method,
                path: execution.path.to_string(),
                message: err.to_string(),
                body: response.body.clone(),
            })?;
        if let Some(target) = compare_to
            && !target.compare_server(&value, true)?
        {
            return Err(HarnessError::EntityMismatch {
                method: execution.method,
                path: execution.path.to_string(),
                kind: target.kind(),
                actual: value,
                expected: target.describe(),
            });
        }
        Ok(Some(value))
    }
}

/// Returns true when a response carries nothing to parse or compare.
#[must_use]
pub fn is_no_content(status: StatusCode, body: &str) -> bool {
    status == StatusCode::NO_CONTENT || status.as_u16() >= 300 || body.trim().is_empty()
}
