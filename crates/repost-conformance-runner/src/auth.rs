// crates/repost-conformance-runner/src/auth.rs
// ============================================================================
// Module: Login Flow
// Description: OAuth2 password-grant form and access token payload.
// Purpose: Keep the login wire format in one place.
// Dependencies: repost-conformance-core, serde
// ============================================================================

//! Login is a URL-encoded form post; the response carries a bearer token.

use std::fmt;

use repost_conformance_core::User;
use serde::Deserialize;

use crate::contract::LOGIN_CLIENT_ID;
use crate::contract::LOGIN_GRANT_TYPE;
use crate::contract::LOGIN_SCOPE;
use crate::transport::RequestBody;

/// Bearer token issued by the login endpoint.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    /// Opaque token value.
    access_token: String,
    /// Token type reported by the server.
    #[serde(default)]
    token_type: Option<String>,
}

impl AccessToken {
    /// Wraps a raw token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            access_token: value.into(),
            token_type: Some("bearer".to_string()),
        }
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.access_token
    }

    /// Returns the token type, when reported.
    #[must_use]
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Builds the password-grant login form for `user`.
#[must_use]
pub fn login_form(user: &User) -> RequestBody {
    login_form_with(user.username(), user.password())
}

/// Builds a password-grant login form from raw credentials.
#[must_use]
pub fn login_form_with(username: &str, password: &str) -> RequestBody {
    RequestBody::Form(vec![
        ("grant_type".to_string(), LOGIN_GRANT_TYPE.to_string()),
        ("username".to_string(), username.to_string()),
        ("password".to_string(), password.to_string()),
        ("client_id".to_string(), LOGIN_CLIENT_ID.to_string()),
        ("scope".to_string(), LOGIN_SCOPE.to_string()),
    ])
}
