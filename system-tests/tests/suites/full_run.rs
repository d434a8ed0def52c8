// system-tests/tests/suites/full_run.rs
// ============================================================================
// Module: Full Run Tests
// Description: End-to-end runs against a conforming in-process server.
// Purpose: Ensure the scenario passes, counts executions, and probes auth.
// Dependencies: system-tests, repost-conformance-runner
// ============================================================================

//! ## Overview
//! A conforming server must pass the full scenario. The executed count must
//! match the requests the server saw, and every authenticated case must be
//! preceded by its two auth probes.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use repost_conformance_runner::HttpMethod;
use repost_conformance_runner::RequestBody;
use repost_conformance_runner::RunEvent;
use repost_conformance_runner::TransportRequest;
use repost_conformance_runner::log::CallKind;
use system_tests::FAKE_BASE_URL;
use system_tests::fake_api::FakeRepostApi;
use system_tests::fake_config;

use crate::helpers::requests_of;
use crate::helpers::run_against;

#[test]
fn conforming_server_passes_full_scenario() {
    let api = FakeRepostApi::new();
    let outcome = run_against(&api, &fake_config(11));
    let summary = outcome.result.expect("conforming run");

    assert!(summary.test_count > 0);
    assert_eq!(summary.test_count, api.requests().len() as u64);
    assert_eq!(summary.test_count, requests_of(&outcome.events).len() as u64);
}

#[test]
fn run_is_bracketed_by_start_and_finish_events() {
    let api = FakeRepostApi::new();
    let outcome = run_against(&api, &fake_config(12));
    let summary = outcome.result.expect("conforming run");

    match outcome.events.first() {
        Some(RunEvent::RunStarted {
            run,
            base_url,
            seed,
        }) => {
            assert_eq!(*run, 0);
            assert_eq!(base_url, FAKE_BASE_URL);
            assert_eq!(*seed, Some(12));
        }
        other => panic!("unexpected first event: {other:?}"),
    }
    match outcome.events.last() {
        Some(RunEvent::RunFinished {
            test_count, ..
        }) => assert_eq!(*test_count, summary.test_count),
        other => panic!("unexpected last event: {other:?}"),
    }
}

#[test]
fn authenticated_cases_are_preceded_by_both_probes() {
    let api = FakeRepostApi::new();
    let outcome = run_against(&api, &fake_config(13));
    outcome.result.expect("conforming run");

    let requests = requests_of(&outcome.events);
    let mut probed = 0;
    for (index, (call, method, path)) in requests.iter().enumerate() {
        if *call != CallKind::MissingToken {
            continue;
        }
        probed += 1;
        let (next_call, next_method, next_path) = &requests[index + 1];
        assert_eq!(*next_call, CallKind::MalformedToken);
        assert_eq!((next_method, next_path), (method, path));
        let (last_call, last_method, last_path) = &requests[index + 2];
        assert_eq!(*last_call, CallKind::Primary);
        assert_eq!((last_method, last_path), (method, path));
    }
    assert!(probed > 0);

    let malformed = requests.iter().filter(|(call, ..)| *call == CallKind::MalformedToken).count();
    assert_eq!(malformed, probed);
}

#[test]
fn missing_token_probes_carry_no_authorization() {
    let api = FakeRepostApi::new();
    let outcome = run_against(&api, &fake_config(14));
    outcome.result.expect("conforming run");

    let journal = api.requests();
    let requests = requests_of(&outcome.events);
    assert_eq!(journal.len(), requests.len());
    for (seen, (call, method, _)) in journal.iter().zip(&requests) {
        assert_eq!(seen.method, *method);
        match call {
            CallKind::MissingToken => assert!(!seen.authorized, "{seen:?}"),
            CallKind::MalformedToken => assert!(seen.authorized, "{seen:?}"),
            CallKind::Primary => {}
        }
    }
}

#[test]
fn scenario_leaves_no_communities_behind() {
    let api = FakeRepostApi::new();
    run_against(&api, &fake_config(15)).result.expect("conforming run");

    let mut transport = api.transport();
    let response = transport
        .call(&TransportRequest {
            method: HttpMethod::Get,
            url: format!("{FAKE_BASE_URL}/api/communities/"),
            headers: BTreeMap::new(),
            body: RequestBody::Empty,
        })
        .expect("list communities");
    assert_eq!(response.status.as_u16(), 200);
    let listed: serde_json::Value = serde_json::from_str(&response.body).expect("json body");
    assert_eq!(listed, serde_json::json!([]));
}

#[test]
fn out_of_range_votes_are_checked_without_credentials() {
    let api = FakeRepostApi::new();
    run_against(&api, &fake_config(16)).result.expect("conforming run");

    let journal = api.requests();
    let out_of_range: BTreeSet<&str> = journal
        .iter()
        .map(|request| request.path.as_str())
        .filter(|path| path.ends_with("/vote/2") || path.ends_with("/vote/-2"))
        .collect();
    assert_eq!(out_of_range.len(), 4, "{out_of_range:?}");
    for path in out_of_range {
        let anonymous = journal.iter().filter(|request| request.path == path && !request.authorized);
        assert_eq!(anonymous.count(), 1, "path: {path}");
    }
}
