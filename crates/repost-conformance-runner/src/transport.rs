// crates/repost-conformance-runner/src/transport.rs
// ============================================================================
// Module: HTTP Transport
// Description: Black-box request boundary and its blocking reqwest backend.
// Purpose: Isolate the tester from the HTTP client so tests can substitute it.
// Dependencies: reqwest, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`Transport`] is the only I/O seam of the harness: one call in, one
//! status and raw body out. [`HttpTransport`] implements it with a blocking
//! reqwest client, so every call completes before the next statement runs.
//! Invariants:
//! - Failures are returned, never retried.
//! - Response bodies are returned verbatim; parsing is the tester's job.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Method;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde_json::Value;
use thiserror::Error;

use crate::endpoint::HttpMethod;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request body variants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON body.
    Json(Value),
    /// URL-encoded form body.
    Form(Vec<(String, String)>),
}

/// One outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Header name/value pairs.
    pub headers: BTreeMap<String, String>,
    /// Request body.
    pub body: RequestBody,
}

impl TransportRequest {
    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and raw body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// Response status.
    pub status: StatusCode,
    /// Raw response body (possibly empty).
    pub body: String,
}

/// Transport failures.
///
/// # Invariants
/// - Every variant is fatal to the run.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(String),
    /// The request could not be sent or no response arrived.
    #[error("{method} {url} failed: {message}")]
    Send {
        /// Request method.
        method: HttpMethod,
        /// Request URL.
        url: String,
        /// Underlying error text.
        message: String,
    },
    /// The response body could not be read.
    #[error("{method} {url} body read failed: {message}")]
    Body {
        /// Request method.
        method: HttpMethod,
        /// Request URL.
        url: String,
        /// Underlying error text.
        message: String,
    },
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Executes one HTTP round-trip.
pub trait Transport {
    /// Sends `request` and returns the response status and body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response could be obtained.
    fn call(&mut self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

// ============================================================================
// SECTION: Reqwest Backend
// ============================================================================

/// Blocking reqwest transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Shared HTTP client.
    client: Client,
}

impl HttpTransport {
    /// Builds a transport with a request timeout and redirect behavior.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] when the client cannot be built.
    pub fn new(timeout: Duration, follow_redirects: bool) -> Result<Self, TransportError> {
        let redirect = if follow_redirects { Policy::default() } else { Policy::none() };
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect)
            .build()
            .map_err(|err| TransportError::Client(err.to_string()))?;
        Ok(Self::with_client(client))
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self {
            client,
        }
    }
}

impl Transport for HttpTransport {
    fn call(&mut self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        };
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(pairs) => builder.form(pairs),
        };
        let response = builder.send().map_err(|err| TransportError::Send {
            method: request.method,
            url: request.url.clone(),
            message: err.to_string(),
        })?;
        let status = response.status();
        let body = response.text().map_err(|err| TransportError::Body {
            method: request.method,
            url: request.url.clone(),
            message: err.to_string(),
        })?;
        Ok(TransportResponse {
            status,
            body,
        })
    }
}
