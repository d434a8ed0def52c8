// crates/repost-conformance-runner/src/tests.rs
// ============================================================================
// Module: Runner Unit Tests
// Description: Tester, endpoint, and vote-model behavior over a scripted transport.
// Purpose: Pin probe ordering, counting, and diagnostics without a server.
// Dependencies: repost-conformance-core, serde_json
// ============================================================================

//! ## Overview
//! A scripted [`Transport`] replays canned responses and records requests so
//! the tester's observable behavior can be asserted exactly.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use repost_conformance_core::Community;
use repost_conformance_core::Entity;
use repost_conformance_core::Post;
use repost_conformance_core::TokenGenerator;
use repost_conformance_core::User;
use reqwest::StatusCode;
use serde_json::json;

use crate::auth::AccessToken;
use crate::auth::login_form;
use crate::context::HarnessContext;
use crate::endpoint::Endpoint;
use crate::endpoint::EndpointResolver;
use crate::endpoint::HttpMethod;
use crate::endpoint::TrailingSlashPolicy;
use crate::endpoint::UserResource;
use crate::error::HarnessError;
use crate::log::CallKind;
use crate::log::MemoryRunLog;
use crate::log::RunEvent;
use crate::tester::RequestTester;
use crate::tester::TestCase;
use crate::tester::is_no_content;
use crate::transport::RequestBody;
use crate::transport::Transport;
use crate::transport::TransportError;
use crate::transport::TransportRequest;
use crate::transport::TransportResponse;
use crate::votes::OUT_OF_RANGE_DELTAS;
use crate::votes::VOTE_SEQUENCE;
use crate::votes::VoteLedger;
use crate::votes::VoteRejected;
use crate::votes::Voter;

// ============================================================================
// SECTION: Scripted Transport
// ============================================================================

type Recorded = Arc<Mutex<Vec<TransportRequest>>>;

struct ScriptedTransport {
    responses: VecDeque<(u16, String)>,
    recorded: Recorded,
}

impl Transport for ScriptedTransport {
    fn call(&mut self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        self.recorded.lock().unwrap().push(request.clone());
        let (status, body) = self.responses.pop_front().ok_or_else(|| TransportError::Send {
            method: request.method,
            url: request.url.clone(),
            message: "script exhausted".to_string(),
        })?;
        Ok(TransportResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body,
        })
    }
}

fn tester(responses: &[(u16, &str)]) -> (RequestTester, Recorded, Arc<MemoryRunLog>) {
    let recorded = Recorded::default();
    let transport = ScriptedTransport {
        responses: responses.iter().map(|(status, body)| (*status, (*body).to_string())).collect(),
        recorded: Arc::clone(&recorded),
    };
    let log = Arc::new(MemoryRunLog::new());
    let endpoints =
        EndpointResolver::new("http://repost.test", "/api", TrailingSlashPolicy::Declared);
    (RequestTester::new(Box::new(transport), endpoints, log.clone()), recorded, log)
}

fn token() -> AccessToken {
    AccessToken::new("tok")
}

// ============================================================================
// SECTION: Endpoints
// ============================================================================

#[test]
fn collection_roots_declare_trailing_slash() {
    let declared = TrailingSlashPolicy::Declared;
    assert_eq!(Endpoint::Users.render(declared), "/users/");
    assert_eq!(Endpoint::Communities.render(declared), "/communities/");
    assert_eq!(Endpoint::CommunityPosts("rust".into()).render(declared), "/communities/rust/posts/");
    assert_eq!(Endpoint::PostComments(4).render(declared), "/posts/4/comments/");
    assert_eq!(Endpoint::Post(4).render(declared), "/posts/4");
    assert_eq!(Endpoint::CurrentUser.render(declared), "/users/me");
    assert_eq!(Endpoint::CommentVote(9, -1).render(declared), "/comments/9/vote/-1");
    assert_eq!(
        Endpoint::UserResources("ann".into(), UserResource::Comments).render(declared),
        "/users/ann/comments"
    );
}

#[test]
fn never_policy_strips_trailing_slash() {
    assert_eq!(Endpoint::Users.render(TrailingSlashPolicy::Never), "/users");
    assert_eq!(Endpoint::PostComments(1).render(TrailingSlashPolicy::Never), "/posts/1/comments");
}

#[test]
fn resolver_normalizes_base_and_prefix() {
    let resolver = EndpointResolver::new("http://h:1/", "api/", TrailingSlashPolicy::Declared);
    assert_eq!(resolver.url(&resolver.path(&Endpoint::Token)), "http://h:1/api/auth/token");
    let bare = EndpointResolver::new("http://h:1", "", TrailingSlashPolicy::Declared);
    assert_eq!(bare.url(&bare.path(&Endpoint::Users)), "http://h:1/users/");
}

// ============================================================================
// SECTION: Request Tester
// ============================================================================

#[test]
fn authenticated_case_probes_missing_then_malformed_token() {
    let (mut tester, recorded, log) = tester(&[(401, ""), (401, ""), (200, r#"{"username":"a"}"#)]);
    let token = token();
    let body = tester
        .test(TestCase::get(Endpoint::CurrentUser, StatusCode::OK).token(&token))
        .unwrap();
    assert_eq!(body, Some(json!({"username": "a"})));
    assert_eq!(tester.executed(), 3);

    let requests = recorded.lock().unwrap();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].header("authorization"), None);
    assert_eq!(requests[1].header("authorization"), Some("Bearer not.a.token"));
    assert_eq!(requests[2].header("authorization"), Some("Bearer tok"));
    assert!(requests.iter().all(|request| request.url == "http://repost.test/api/users/me"));

    let calls: Vec<CallKind> = log
        .events()
        .into_iter()
        .filter_map(|event| match event {
            RunEvent::Request {
                call,
                ..
            } => Some(call),
            _ => None,
        })
        .collect();
    assert_eq!(calls, [CallKind::MissingToken, CallKind::MalformedToken, CallKind::Primary]);
}

#[test]
fn probes_resend_the_same_body() {
    let (mut tester, recorded, _) = tester(&[(401, ""), (401, ""), (201, "")]);
    let token = token();
    tester
        .test(
            TestCase::post(Endpoint::Communities, StatusCode::CREATED)
                .token(&token)
                .json(json!({"name": "n"})),
        )
        .unwrap();
    let requests = recorded.lock().unwrap();
    assert!(requests.iter().all(|request| request.body == RequestBody::Json(json!({"name": "n"}))));
    assert!(requests.iter().all(|request| request.method == HttpMethod::Post));
}

#[test]
fn skipped_probe_and_anonymous_cases_execute_once() {
    let (mut tester, recorded, _) = tester(&[(404, "{}"), (404, "{}")]);
    let token = token();
    tester
        .test(
            TestCase::patch(Endpoint::Community("x".into()), StatusCode::NOT_FOUND)
                .token(&token)
                .skip_auth_probe(),
        )
        .unwrap();
    tester.test(TestCase::get(Endpoint::Community("x".into()), StatusCode::NOT_FOUND)).unwrap();
    assert_eq!(tester.executed(), 2);
    assert_eq!(recorded.lock().unwrap().len(), 2);
}

#[test]
fn probe_failure_names_the_probe_expectation() {
    let (mut tester, recorded, _) = tester(&[(200, "{}")]);
    let token = token();
    let err = tester
        .test(TestCase::delete(Endpoint::Post(1), StatusCode::OK).token(&token))
        .unwrap_err();
    match err {
        HarnessError::UnexpectedStatus {
            method,
            path,
            actual,
            expected,
            ..
        } => {
            assert_eq!(method, HttpMethod::Delete);
            assert_eq!(path, "/posts/1");
            assert_eq!(actual, 200);
            assert_eq!(expected, 401);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(tester.executed(), 1);
    assert_eq!(recorded.lock().unwrap().len(), 1);
}

#[test]
fn status_mismatch_diagnostic_carries_raw_body() {
    let (mut tester, _, _) = tester(&[(500, "boom")]);
    let err = tester.test(TestCase::get(Endpoint::Users, StatusCode::OK)).unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("GET /users/"));
    assert!(rendered.contains("500"));
    assert!(rendered.contains("boom"));
}

#[test]
fn no_content_responses_skip_parsing_and_compare() {
    assert!(is_no_content(StatusCode::NO_CONTENT, "{}"));
    assert!(is_no_content(StatusCode::NOT_FOUND, r#"{"detail":"x"}"#));
    assert!(is_no_content(StatusCode::OK, "  "));
    assert!(!is_no_content(StatusCode::CREATED, "{}"));

    let mut tokens = TokenGenerator::from_seed(3);
    let mut post = Post::random("a", "c", &mut tokens);
    let (mut tester, _, _) = tester(&[(404, "not json"), (200, "")]);
    let missing = tester
        .test(TestCase::get(Endpoint::Post(7), StatusCode::NOT_FOUND).compare(&mut post))
        .unwrap();
    assert_eq!(missing, None);
    let empty =
        tester.test(TestCase::get(Endpoint::Post(7), StatusCode::OK).compare(&mut post)).unwrap();
    assert_eq!(empty, None);
    assert_eq!(post.id, None);
}

#[test]
fn compare_target_adopts_server_id() {
    let mut tokens = TokenGenerator::from_seed(3);
    let mut post = Post::random("a", "c", &mut tokens);
    let response = json!({"id": 21, "title": post.title, "votes": 0}).to_string();
    let (mut tester, _, _) = tester(&[(201, response.as_str())]);
    tester
        .test(TestCase::post(Endpoint::CommunityPosts("c".into()), StatusCode::CREATED).compare(&mut post))
        .unwrap();
    assert_eq!(post.id, Some(21));
}

#[test]
fn compare_mismatch_reports_expected_snapshot() {
    let mut tokens = TokenGenerator::from_seed(3);
    let mut user = User::random(&mut tokens);
    let (mut tester, _, _) = tester(&[(200, r#"{"username":"someone-else"}"#)]);
    let err = tester
        .test(TestCase::get(Endpoint::User(user.username().into()), StatusCode::OK).compare(&mut user))
        .unwrap_err();
    match err {
        HarnessError::EntityMismatch {
            kind,
            actual,
            expected,
            ..
        } => {
            assert_eq!(kind, "user");
            assert_eq!(actual, json!({"username": "someone-else"}));
            assert_eq!(expected["username"], json!(user.username()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_json_is_reported() {
    let (mut tester, _, _) = tester(&[(200, "<html>")]);
    let err = tester.test(TestCase::get(Endpoint::Communities, StatusCode::OK)).unwrap_err();
    assert!(matches!(err, HarnessError::InvalidJson { .. }));
}

#[test]
fn transport_failures_are_fatal() {
    let (mut tester, _, _) = tester(&[]);
    let err = tester.test(TestCase::get(Endpoint::Users, StatusCode::OK)).unwrap_err();
    assert!(matches!(err, HarnessError::Transport(TransportError::Send { .. })));
}

// ============================================================================
// SECTION: Context Helpers
// ============================================================================

#[test]
fn listing_requires_an_array() {
    let (tester, _, log) = tester(&[(200, r#"{"items":[]}"#)]);
    let mut ctx = HarnessContext::new(tester, TokenGenerator::from_seed(1), log);
    let err = ctx.listing(Endpoint::Communities).unwrap_err();
    assert!(matches!(err, HarnessError::NotAList { .. }));
}

#[test]
fn listed_entity_may_appear_more_than_once() {
    let mut tokens = TokenGenerator::from_seed(1);
    let community = Community::random("ann", &mut tokens);
    let other = Community::random("bob", &mut tokens);
    let body = json!([other.snapshot(), community.snapshot(), community.snapshot()]).to_string();
    let (tester, _, log) = tester(&[(200, body.as_str()), (200, "[]")]);
    let mut ctx = HarnessContext::new(tester, tokens, log);

    ctx.expect_listed(Endpoint::Communities, &community).unwrap();
    let err = ctx.expect_listed(Endpoint::Communities, &community).unwrap_err();
    assert!(matches!(err, HarnessError::MissingFromListing { kind: "community", .. }));
}

#[test]
fn login_requires_access_token() {
    let mut tokens = TokenGenerator::from_seed(1);
    let user = User::random(&mut tokens);
    let (tester, recorded, log) =
        tester(&[(200, r#"{"access_token":"abc","token_type":"bearer"}"#), (200, "{}")]);
    let mut ctx = HarnessContext::new(tester, tokens, log);

    let token = ctx.login(&user).unwrap();
    assert_eq!(token.value(), "abc");
    assert_eq!(token.token_type(), Some("bearer"));
    assert_eq!(recorded.lock().unwrap()[0].body, login_form(&user));

    let err = ctx.login(&user).unwrap_err();
    assert!(matches!(err, HarnessError::MissingAccessToken { .. }));
    assert_eq!(ctx.test_count(), 2);
}

#[test]
fn login_form_uses_password_grant() {
    let mut tokens = TokenGenerator::from_seed(1);
    let user = User::random(&mut tokens);
    let RequestBody::Form(pairs) = login_form(&user) else {
        panic!("login must be a form body");
    };
    let keys: Vec<&str> = pairs.iter().map(|(key, _)| key.as_str()).collect();
    assert_eq!(keys, ["grant_type", "username", "password", "client_id", "scope"]);
    assert_eq!(pairs[0].1, "password");
    assert_eq!(pairs[3].1, "repost");
    assert_eq!(pairs[4].1, "user");
}

#[test]
fn access_token_debug_is_redacted() {
    let rendered = format!("{:?}", AccessToken::new("secret-value"));
    assert!(!rendered.contains("secret-value"));
}

// ============================================================================
// SECTION: Vote Model
// ============================================================================

#[test]
fn ledger_reproduces_the_fixed_sequence() {
    let mut ledger = VoteLedger::new();
    let totals: Vec<i64> =
        VOTE_SEQUENCE.iter().map(|step| ledger.cast(step.voter, step.delta).unwrap()).collect();
    assert_eq!(totals, [0_i64, -1, -1, -2, 0, 1, 2]);
    let expected: Vec<i64> = VOTE_SEQUENCE.iter().map(|step| step.expected_total).collect();
    assert_eq!(totals, expected);
}

#[test]
fn ledger_repeats_are_idempotent_and_switches_apply_difference() {
    let mut ledger = VoteLedger::new();
    assert_eq!(ledger.cast(Voter::First, 1), Ok(1));
    assert_eq!(ledger.cast(Voter::First, 1), Ok(1));
    assert_eq!(ledger.cast(Voter::First, -1), Ok(-1));
    assert_eq!(ledger.cast(Voter::Second, -1), Ok(-2));
    assert_eq!(ledger.cast(Voter::First, 0), Ok(-1));
}

#[test]
fn ledger_rejects_out_of_range_without_change() {
    let mut ledger = VoteLedger::new();
    ledger.cast(Voter::Second, 1).unwrap();
    for delta in OUT_OF_RANGE_DELTAS {
        assert_eq!(ledger.cast(Voter::First, delta), Err(VoteRejected::OutOfRange(delta)));
    }
    assert_eq!(ledger.total(), 1);
}
