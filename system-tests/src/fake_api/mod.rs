// system-tests/src/fake_api/mod.rs
// ============================================================================
// Module: Fake Repost API
// Description: In-process Repost server reachable through the Transport trait.
// Purpose: Run the full conformance scenario without sockets or a live server.
// Dependencies: repost-conformance-runner, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! [`FakeRepostApi`] implements [`Transport`] directly: it parses the request
//! URL into a [`Route`], authenticates bearer credentials, and dispatches to
//! the in-memory server state. Clones share one server, so a transport handed to
//! every run of a repeated session sees the accumulated data of earlier runs.
//! [`Quirk`]s switch on known deviations from the contract so suites can
//! prove the harness notices them.
//! Invariants:
//! - Protected routes authenticate before any lookup or validation.
//! - Trailing slashes are ignored when matching routes.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod state;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;

use repost_conformance_runner::HttpMethod;
use repost_conformance_runner::RequestBody;
use repost_conformance_runner::Transport;
use repost_conformance_runner::TransportError;
use repost_conformance_runner::TransportRequest;
use repost_conformance_runner::TransportResponse;
use reqwest::StatusCode;
use serde_json::Map;
use serde_json::Value;
use url::Url;

use self::state::ApiState;
use self::state::Handled;
use self::state::Reply;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Deliberate deviations from the Repost contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Quirk {
    /// Unknown bearer tokens get 400 instead of 401.
    MalformedTokenBadRequest,
    /// Repeated votes add up instead of replacing the voter's last value.
    VotesAccumulate,
    /// Tokens stay valid after their account is deleted.
    TokensSurviveDeletion,
    /// Identical resubmissions return the original post or comment.
    DuplicatesShareId,
}

/// One request as seen by the fake server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Request method.
    pub method: HttpMethod,
    /// URL path, prefix included.
    pub path: String,
    /// Whether an `Authorization` header was sent.
    pub authorized: bool,
}

/// Server state plus the request journal.
#[derive(Debug, Default)]
struct Shared {
    /// Users, content, and tokens.
    state: ApiState,
    /// Every request in arrival order.
    requests: Vec<RecordedRequest>,
}

/// Recognized API routes, relative to the API prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/users`
    Users,
    /// `/users/me`
    CurrentUser,
    /// `/users/{username}`
    User(String),
    /// `/users/{username}/communities`
    UserCommunities(String),
    /// `/users/{username}/posts`
    UserPosts(String),
    /// `/users/{username}/comments`
    UserComments(String),
    /// `/auth/token`
    Token,
    /// `/communities`
    Communities,
    /// `/communities/{name}`
    Community(String),
    /// `/communities/{name}/posts`
    CommunityPosts(String),
    /// `/posts/{id}`
    Post(u64),
    /// `/posts/{id}/vote/{value}`; the value is validated by the handler.
    PostVote(u64, String),
    /// `/posts/{id}/comments`
    PostComments(u64),
    /// `/comments/{id}`
    Comment(u64),
    /// `/comments/{id}/vote/{value}`
    CommentVote(u64, String),
}

impl Route {
    /// Matches a path; unknown shapes and non-numeric ids yield `None`.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let route = match segments.as_slice() {
            ["users"] => Self::Users,
            ["users", "me"] => Self::CurrentUser,
            ["users", name] => Self::User((*name).to_string()),
            ["users", name, "communities"] => Self::UserCommunities((*name).to_string()),
            ["users", name, "posts"] => Self::UserPosts((*name).to_string()),
            ["users", name, "comments"] => Self::UserComments((*name).to_string()),
            ["auth", "token"] => Self::Token,
            ["communities"] => Self::Communities,
            ["communities", name] => Self::Community((*name).to_string()),
            ["communities", name, "posts"] => Self::CommunityPosts((*name).to_string()),
            ["posts", id] => Self::Post(id.parse().ok()?),
            ["posts", id, "vote", value] => Self::PostVote(id.parse().ok()?, (*value).to_string()),
            ["posts", id, "comments"] => Self::PostComments(id.parse().ok()?),
            ["comments", id] => Self::Comment(id.parse().ok()?),
            ["comments", id, "vote", value] => {
                Self::CommentVote(id.parse().ok()?, (*value).to_string())
            }
            _ => return None,
        };
        Some(route)
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Shared handle to an in-memory Repost server.
#[derive(Debug, Clone)]
pub struct FakeRepostApi {
    /// Path prefix stripped before routing.
    api_prefix: String,
    /// Server state shared by all clones.
    shared: Arc<Mutex<Shared>>,
}

impl Default for FakeRepostApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRepostApi {
    /// Creates a conforming server mounted at `/api`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_quirks(&[])
    }

    /// Creates a server exhibiting the given deviations.
    #[must_use]
    pub fn with_quirks(quirks: &[Quirk]) -> Self {
        let quirks: BTreeSet<Quirk> = quirks.iter().copied().collect();
        Self {
            api_prefix: "/api".to_string(),
            shared: Arc::new(Mutex::new(Shared {
                state: ApiState::new(quirks),
                requests: Vec::new(),
            })),
        }
    }

    /// Mounts the server under another prefix (`""` for the root).
    #[must_use]
    pub fn with_api_prefix(mut self, prefix: &str) -> Self {
        let trimmed = prefix.trim().trim_end_matches('/');
        self.api_prefix = if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        self
    }

    /// Returns a boxed transport sharing this server.
    #[must_use]
    pub fn transport(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }

    /// Returns every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared.lock().map(|shared| shared.requests.clone()).unwrap_or_default()
    }
}

impl Transport for FakeRepostApi {
    fn call(&mut self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let send_error = |message: String| TransportError::Send {
            method: request.method,
            url: request.url.clone(),
            message,
        };
        let url = Url::parse(&request.url).map_err(|err| send_error(err.to_string()))?;
        let path = url.path().to_string();
        let mut shared =
            self.shared.lock().map_err(|_| send_error("fake server state poisoned".to_string()))?;
        shared.requests.push(RecordedRequest {
            method: request.method,
            path: path.clone(),
            authorized: request.header("Authorization").is_some(),
        });
        let route = path.strip_prefix(self.api_prefix.as_str()).and_then(Route::parse);
        let reply = match route {
            Some(route) => respond(&mut shared.state, request, route).unwrap_or_else(|reply| reply),
            None => Reply::error(StatusCode::NOT_FOUND, "Not Found"),
        };
        let body = if reply.body.is_null() { String::new() } else { reply.body.to_string() };
        Ok(TransportResponse {
            status: reply.status,
            body,
        })
    }
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Decodes a JSON object body; an absent body counts as `{}`.
fn json_object(body: &RequestBody) -> Result<Map<String, Value>, Reply> {
    match body {
        RequestBody::Empty => Ok(Map::new()),
        RequestBody::Json(Value::Object(object)) => Ok(object.clone()),
        RequestBody::Json(_) | RequestBody::Form(_) => {
            Err(Reply::error(StatusCode::UNPROCESSABLE_ENTITY, "expected a JSON object"))
        }
    }
}

/// Returns the pairs of a URL-encoded form body.
fn form_pairs(body: &RequestBody) -> Result<&[(String, String)], Reply> {
    match body {
        RequestBody::Form(pairs) => Ok(pairs.as_slice()),
        RequestBody::Empty | RequestBody::Json(_) => {
            Err(Reply::error(StatusCode::UNPROCESSABLE_ENTITY, "expected a form body"))
        }
    }
}

/// Routes one request to its handler.
fn respond(state: &mut ApiState, request: &TransportRequest, route: Route) -> Handled {
    let authorization = request.header("Authorization");
    let body = &request.body;
    match (request.method, route) {
        (HttpMethod::Post, Route::Users) => state.create_user(&json_object(body)?),
        (HttpMethod::Get, Route::User(name)) => state.get_user(&name),
        (HttpMethod::Get, Route::CurrentUser) => {
            let actor = state.authenticate(authorization)?;
            state.get_user(&actor)
        }
        (HttpMethod::Patch, Route::CurrentUser) => {
            let actor = state.authenticate(authorization)?;
            state.edit_user(&actor, &json_object(body)?)
        }
        (HttpMethod::Delete, Route::CurrentUser) => {
            let actor = state.authenticate(authorization)?;
            state.delete_user(&actor)
        }
        (HttpMethod::Get, Route::UserCommunities(name)) => state.user_communities(&name),
        (HttpMethod::Get, Route::UserPosts(name)) => state.user_posts(&name),
        (HttpMethod::Get, Route::UserComments(name)) => state.user_comments(&name),
        (HttpMethod::Post, Route::Token) => state.login(form_pairs(body)?),
        (HttpMethod::Get, Route::Communities) => Ok(state.list_communities()),
        (HttpMethod::Post, Route::Communities) => {
            let actor = state.authenticate(authorization)?;
            state.create_community(&actor, &json_object(body)?)
        }
        (HttpMethod::Get, Route::Community(name)) => state.get_community(&name),
        (HttpMethod::Patch, Route::Community(name)) => {
            let actor = state.authenticate(authorization)?;
            state.edit_community(&actor, &name, &json_object(body)?)
        }
        (HttpMethod::Delete, Route::Community(name)) => {
            let actor = state.authenticate(authorization)?;
            state.delete_community(&actor, &name)
        }
        (HttpMethod::Get, Route::CommunityPosts(name)) => state.community_posts(&name),
        (HttpMethod::Post, Route::CommunityPosts(name)) => {
            let actor = state.authenticate(authorization)?;
            state.create_post(&actor, &name, &json_object(body)?)
        }
        (HttpMethod::Get, Route::Post(id)) => state.get_post(id),
        (HttpMethod::Patch, Route::Post(id)) => {
            let actor = state.authenticate(authorization)?;
            state.edit_post(&actor, id, &json_object(body)?)
        }
        (HttpMethod::Delete, Route::Post(id)) => {
            let actor = state.authenticate(authorization)?;
            state.delete_post(&actor, id)
        }
        (HttpMethod::Post, Route::PostVote(id, value)) => {
            let actor = state.authenticate(authorization)?;
            state.vote_post(&actor, id, &value)
        }
        (HttpMethod::Get, Route::PostComments(id)) => state.post_comments(id),
        (HttpMethod::Post, Route::PostComments(id)) => {
            let actor = state.authenticate(authorization)?;
            state.comment_on_post(&actor, id, &json_object(body)?)
        }
        (HttpMethod::Get, Route::Comment(id)) => state.get_comment(id),
        (HttpMethod::Post, Route::Comment(id)) => {
            let actor = state.authenticate(authorization)?;
            state.reply_to_comment(&actor, id, &json_object(body)?)
        }
        (HttpMethod::Patch, Route::Comment(id)) => {
            let actor = state.authenticate(authorization)?;
            state.edit_comment(&actor, id, &json_object(body)?)
        }
        (HttpMethod::Delete, Route::Comment(id)) => {
            let actor = state.authenticate(authorization)?;
            state.delete_comment(&actor, id)
        }
        (HttpMethod::Post, Route::CommentVote(id, value)) => {
            let actor = state.authenticate(authorization)?;
            state.vote_comment(&actor, id, &value)
        }
        _ => Err(Reply::error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use repost_conformance_runner::HttpMethod;
    use repost_conformance_runner::RequestBody;
    use repost_conformance_runner::Transport;
    use repost_conformance_runner::TransportRequest;
    use repost_conformance_runner::auth::login_form_with;
    use serde_json::Value;
    use serde_json::json;

    use super::FakeRepostApi;
    use super::Quirk;
    use super::Route;

    fn call(
        api: &mut FakeRepostApi,
        method: HttpMethod,
        path: &str,
        token: Option<&str>,
        body: RequestBody,
    ) -> (u16, Value) {
        let mut request = TransportRequest {
            method,
            url: format!("http://repost.test/api{path}"),
            headers: std::collections::BTreeMap::new(),
            body,
        };
        if let Some(token) = token {
            request.headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        let response = api.call(&request).unwrap();
        let body = if response.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response.body).unwrap()
        };
        (response.status.as_u16(), body)
    }

    fn register(api: &mut FakeRepostApi, username: &str) -> String {
        let body = RequestBody::Json(json!({"username": username, "password": "pw"}));
        assert_eq!(call(api, HttpMethod::Post, "/users/", None, body).0, 201);
        let (status, token) =
            call(api, HttpMethod::Post, "/auth/token", None, login_form_with(username, "pw"));
        assert_eq!(status, 200);
        token["access_token"].as_str().unwrap().to_string()
    }

    #[test]
    fn routes_ignore_trailing_slashes() {
        assert_eq!(Route::parse("/users/"), Some(Route::Users));
        assert_eq!(Route::parse("/users"), Some(Route::Users));
        assert_eq!(Route::parse("/posts/7/vote/-1"), Some(Route::PostVote(7, "-1".to_string())));
        assert_eq!(Route::parse("/posts/abc"), None);
        assert_eq!(Route::parse("/unknown"), None);
    }

    #[test]
    fn protected_routes_authenticate_before_lookup() {
        let mut api = FakeRepostApi::new();
        let (status, _) = call(&mut api, HttpMethod::Delete, "/posts/99", None, RequestBody::Empty);
        assert_eq!(status, 401);
        let (status, _) =
            call(&mut api, HttpMethod::Delete, "/posts/99", Some("not.a.token"), RequestBody::Empty);
        assert_eq!(status, 401);
        let token = register(&mut api, "ann");
        let (status, _) = call(&mut api, HttpMethod::Delete, "/posts/99", Some(&token), RequestBody::Empty);
        assert_eq!(status, 404);
    }

    #[test]
    fn votes_replace_unless_accumulating() {
        for (quirks, expected) in [(vec![], 1), (vec![Quirk::VotesAccumulate], 2)] {
            let mut api = FakeRepostApi::with_quirks(&quirks);
            let token = register(&mut api, "ann");
            let community = RequestBody::Json(json!({"name": "c", "description": "d"}));
            call(&mut api, HttpMethod::Post, "/communities/", Some(&token), community);
            let post = RequestBody::Json(json!({"title": "t", "url": null, "content": null}));
            let (_, created) =
                call(&mut api, HttpMethod::Post, "/communities/c/posts/", Some(&token), post);
            let id = created["id"].as_u64().unwrap();
            let path = format!("/posts/{id}/vote/1");
            call(&mut api, HttpMethod::Post, &path, Some(&token), RequestBody::Empty);
            let (status, voted) = call(&mut api, HttpMethod::Post, &path, Some(&token), RequestBody::Empty);
            assert_eq!(status, 200);
            assert_eq!(voted["votes"], json!(expected));
        }
    }

    #[test]
    fn out_of_range_votes_are_unprocessable() {
        let mut api = FakeRepostApi::new();
        let token = register(&mut api, "ann");
        call(
            &mut api,
            HttpMethod::Post,
            "/communities/",
            Some(&token),
            RequestBody::Json(json!({"name": "c", "description": "d"})),
        );
        let (_, post) = call(
            &mut api,
            HttpMethod::Post,
            "/communities/c/posts/",
            Some(&token),
            RequestBody::Json(json!({"title": "t"})),
        );
        let path = format!("/posts/{}/vote/2", post["id"]);
        let (status, _) = call(&mut api, HttpMethod::Post, &path, Some(&token), RequestBody::Empty);
        assert_eq!(status, 422);
    }

    #[test]
    fn deleting_an_account_revokes_its_tokens() {
        let mut api = FakeRepostApi::new();
        let token = register(&mut api, "ann");
        let (status, _) = call(&mut api, HttpMethod::Delete, "/users/me", Some(&token), RequestBody::Empty);
        assert_eq!(status, 200);
        let (status, _) = call(&mut api, HttpMethod::Get, "/users/me", Some(&token), RequestBody::Empty);
        assert_eq!(status, 401);
    }

    #[test]
    fn requests_are_journaled_with_prefix() {
        let mut api = FakeRepostApi::new().with_api_prefix("v2/");
        let mut request = TransportRequest {
            method: HttpMethod::Get,
            url: "http://repost.test/v2/communities/".to_string(),
            headers: std::collections::BTreeMap::new(),
            body: RequestBody::Empty,
        };
        assert_eq!(api.call(&request).unwrap().status.as_u16(), 200);
        request.url = "http://repost.test/api/communities/".to_string();
        assert_eq!(api.call(&request).unwrap().status.as_u16(), 404);
        let journal = api.requests();
        assert_eq!(journal.len(), 2);
        assert_eq!(journal[0].path, "/v2/communities/");
        assert!(!journal[0].authorized);
    }
}
