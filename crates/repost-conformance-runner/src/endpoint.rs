// crates/repost-conformance-runner/src/endpoint.rs
// ============================================================================
// Module: API Endpoints
// Description: Typed Repost API routes with declared trailing-slash behavior.
// Purpose: Build request URLs without ad hoc string formatting at call sites.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every route the harness calls is an [`Endpoint`] variant. Collection roots
//! declare that they carry a trailing slash (the server framework redirects
//! or rejects the slash-less form); all other routes declare none. The
//! declared convention is applied unless the run selects
//! [`TrailingSlashPolicy::Never`].
//! Invariants:
//! - The convention is a property of the endpoint, never inferred at runtime.

use std::fmt;

use serde::Serialize;

// ============================================================================
// SECTION: Methods
// ============================================================================

/// HTTP methods used by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PATCH.
    Patch,
    /// DELETE.
    Delete,
}

impl HttpMethod {
    /// Returns the method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Trailing Slash Policy
// ============================================================================

/// How trailing slashes are applied to rendered paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingSlashPolicy {
    /// Use each endpoint's declared convention.
    #[default]
    Declared,
    /// Never emit a trailing slash.
    Never,
}

impl TrailingSlashPolicy {
    /// Parses a policy label (`declared` or `never`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "declared" => Some(Self::Declared),
            "never" => Some(Self::Never),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Endpoints
// ============================================================================

/// Per-user listing resources under `/users/{username}/{resource}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserResource {
    /// Communities owned by the user.
    Communities,
    /// Posts authored by the user.
    Posts,
    /// Comments authored by the user.
    Comments,
}

impl UserResource {
    /// Returns the path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Communities => "communities",
            Self::Posts => "posts",
            Self::Comments => "comments",
        }
    }
}

/// Repost API route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `/users/`
    Users,
    /// `/users/{username}`
    User(String),
    /// `/users/me`
    CurrentUser,
    /// `/users/{username}/{resource}`
    UserResources(String, UserResource),
    /// `/auth/token`
    Token,
    /// `/communities/`
    Communities,
    /// `/communities/{name}`
    Community(String),
    /// `/communities/{name}/posts/`
    CommunityPosts(String),
    /// `/posts/{id}`
    Post(u64),
    /// `/posts/{id}/vote/{delta}`
    PostVote(u64, i64),
    /// `/posts/{id}/comments/`
    PostComments(u64),
    /// `/comments/{id}`; POST on it creates a reply.
    Comment(u64),
    /// `/comments/{id}/vote/{delta}`
    CommentVote(u64, i64),
}

impl Endpoint {
    /// Returns the path without any trailing slash.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Users => "/users".to_string(),
            Self::User(username) => format!("/users/{username}"),
            Self::CurrentUser => "/users/me".to_string(),
            Self::UserResources(username, resource) => {
                format!("/users/{username}/{}", resource.as_str())
            }
            Self::Token => "/auth/token".to_string(),
            Self::Communities => "/communities".to_string(),
            Self::Community(name) => format!("/communities/{name}"),
            Self::CommunityPosts(name) => format!("/communities/{name}/posts"),
            Self::Post(id) => format!("/posts/{id}"),
            Self::PostVote(id, delta) => format!("/posts/{id}/vote/{delta}"),
            Self::PostComments(id) => format!("/posts/{id}/comments"),
            Self::Comment(id) => format!("/comments/{id}"),
            Self::CommentVote(id, delta) => format!("/comments/{id}/vote/{delta}"),
        }
    }

    /// Returns true when the endpoint is declared with a trailing slash.
    #[must_use]
    pub const fn declares_trailing_slash(&self) -> bool {
        matches!(
            self,
            Self::Users | Self::Communities | Self::CommunityPosts(_) | Self::PostComments(_)
        )
    }

    /// Renders the path under the given policy.
    #[must_use]
    pub fn render(&self, policy: TrailingSlashPolicy) -> String {
        let mut path = self.path();
        if policy == TrailingSlashPolicy::Declared && self.declares_trailing_slash() {
            path.push('/');
        }
        path
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Joins rendered endpoint paths onto the server base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResolver {
    /// Base URL without a trailing slash.
    base_url: String,
    /// API prefix with a leading slash and no trailing slash (may be empty).
    api_prefix: String,
    /// Trailing-slash policy.
    policy: TrailingSlashPolicy,
}

impl EndpointResolver {
    /// Creates a resolver, normalizing slashes on the base URL and prefix.
    #[must_use]
    pub fn new(base_url: &str, api_prefix: &str, policy: TrailingSlashPolicy) -> Self {
        let prefix = api_prefix.trim_matches('/');
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_prefix: if prefix.is_empty() { String::new() } else { format!("/{prefix}") },
            policy,
        }
    }

    /// Returns the rendered path used in diagnostics.
    #[must_use]
    pub fn path(&self, endpoint: &Endpoint) -> String {
        endpoint.render(self.policy)
    }

    /// Returns the absolute URL for a rendered path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }
}
