// system-tests/tests/suites/sessions.rs
// ============================================================================
// Module: Session Tests
// Description: Seeding, repeated runs, and configuration variants.
// Purpose: Ensure runs are reproducible and honor path configuration.
// Dependencies: system-tests, repost-conformance-core, repost-conformance-runner
// ============================================================================

//! ## Overview
//! Covers seeded reproducibility, back-to-back runs on one server, prefix
//! and trailing-slash variants, and configuration failures.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::sync::Arc;

use repost_conformance_core::TokenGenerator;
use repost_conformance_core::User;
use repost_conformance_runner::ConfigError;
use repost_conformance_runner::HarnessConfig;
use repost_conformance_runner::HarnessError;
use repost_conformance_runner::HttpMethod;
use repost_conformance_runner::MemoryRunLog;
use repost_conformance_runner::MultiRunSummary;
use repost_conformance_runner::RunEvent;
use repost_conformance_runner::RunLog;
use repost_conformance_runner::TrailingSlashPolicy;
use repost_conformance_runner::TransportError;
use repost_conformance_runner::run_many;
use repost_conformance_runner::run_once;
use system_tests::fake_api::FakeRepostApi;
use system_tests::fake_api::Quirk;
use system_tests::fake_config;

use crate::helpers::run_against;

#[test]
fn same_seed_replays_identical_requests() {
    let first = FakeRepostApi::new();
    let second = FakeRepostApi::new();
    let a = run_against(&first, &fake_config(31)).result.expect("first run");
    let b = run_against(&second, &fake_config(31)).result.expect("second run");

    assert_eq!(a.test_count, b.test_count);
    assert_eq!(first.requests(), second.requests());
}

#[test]
fn different_seeds_execute_the_same_count() {
    let a = run_against(&FakeRepostApi::new(), &fake_config(32)).result.expect("first run");
    let b = run_against(&FakeRepostApi::new(), &fake_config(33)).result.expect("second run");
    assert_eq!(a.test_count, b.test_count);
}

#[test]
fn first_request_looks_up_the_seeded_username() {
    let api = FakeRepostApi::new();
    run_against(&api, &fake_config(34)).result.expect("conforming run");

    let expected = User::random(&mut TokenGenerator::from_seed(34));
    let first = api.requests().into_iter().next().expect("a request");
    assert_eq!(first.method, HttpMethod::Get);
    assert_eq!(first.path, format!("/api/users/{}", expected.username()));
    assert!(!first.authorized);
}

#[test]
fn repeated_runs_share_one_server() {
    let api = FakeRepostApi::new();
    let log = Arc::new(MemoryRunLog::new());
    let sink: Arc<dyn RunLog> = log.clone();
    let mut passed = Vec::new();
    let summaries = run_many(&fake_config(35), 3, &sink, || Ok(api.transport()), |run, summary| {
        passed.push((run, summary.test_count));
    })
    .expect("three runs");

    assert_eq!(summaries.len(), 3);
    let expected: Vec<(u32, u64)> =
        summaries.iter().zip(0 ..).map(|(summary, run)| (run, summary.test_count)).collect();
    assert_eq!(passed, expected);
    assert!(summaries.iter().all(|summary| summary.test_count == summaries[0].test_count));
    assert_eq!(api.requests().len() as u64, summaries[0].test_count * 3);

    let aggregate = MultiRunSummary::from_runs(&summaries).expect("aggregate");
    assert_eq!(aggregate.runs, 3);
    assert_eq!(aggregate.test_count, summaries[0].test_count * 3);

    let seeds: Vec<Option<u64>> = log
        .events()
        .into_iter()
        .filter_map(|event| match event {
            RunEvent::RunStarted {
                seed, ..
            } => Some(seed),
            _ => None,
        })
        .collect();
    assert_eq!(seeds, vec![Some(35), Some(36), Some(37)]);
}

#[test]
fn transport_construction_failure_stops_repeated_runs() {
    let sink: Arc<dyn RunLog> = Arc::new(MemoryRunLog::new());
    let mut passed = 0;
    let err = run_many(
        &fake_config(36),
        2,
        &sink,
        || Err(TransportError::Client("offline".to_string())),
        |_, _| passed += 1,
    )
    .expect_err("no transport");
    assert_eq!(err.number, 1);
    assert!(matches!(err.source, HarnessError::Transport(TransportError::Client(_))));
    assert!(err.to_string().starts_with("Run 1 failed\n"));
    assert_eq!(passed, 0);
}

#[test]
fn failing_run_is_numbered_from_one() {
    let healthy = FakeRepostApi::new();
    let broken = FakeRepostApi::with_quirks(&[Quirk::MalformedTokenBadRequest]);
    let sink: Arc<dyn RunLog> = Arc::new(MemoryRunLog::new());
    let mut calls = 0;
    let mut passed = Vec::new();
    let err = run_many(
        &fake_config(42),
        3,
        &sink,
        || {
            calls += 1;
            Ok(if calls == 1 { healthy.transport() } else { broken.transport() })
        },
        |run, _| passed.push(run),
    )
    .expect_err("second run diverges");
    assert_eq!(err.number, 2);
    assert!(matches!(err.source, HarnessError::UnexpectedStatus { actual: 400, .. }));
    assert_eq!(passed, vec![0]);
}

#[test]
fn missing_base_url_is_rejected_before_any_request() {
    let api = FakeRepostApi::new();
    let config = HarnessConfig {
        base_url: None,
        ..fake_config(37)
    };
    let err = run_once(&config, api.transport(), Arc::new(MemoryRunLog::new()), 0)
        .expect_err("missing base URL");
    assert!(matches!(err, HarnessError::Config(ConfigError::MissingBaseUrl)));
    assert!(api.requests().is_empty());
}

#[test]
fn declared_policy_keeps_collection_slashes() {
    let api = FakeRepostApi::new();
    run_against(&api, &fake_config(38)).result.expect("conforming run");
    assert!(api.requests().iter().any(|request| request.path == "/api/users/"));
}

#[test]
fn never_policy_drops_every_trailing_slash() {
    let api = FakeRepostApi::new();
    let config = HarnessConfig {
        trailing_slash: TrailingSlashPolicy::Never,
        ..fake_config(39)
    };
    run_against(&api, &config).result.expect("conforming run");
    assert!(api.requests().iter().all(|request| !request.path.ends_with('/')));
}

#[test]
fn custom_api_prefix_is_honored() {
    let api = FakeRepostApi::new().with_api_prefix("/v1");
    let config = HarnessConfig {
        api_prefix: "/v1".to_string(),
        ..fake_config(40)
    };
    run_against(&api, &config).result.expect("conforming run");
    assert!(api.requests().iter().all(|request| request.path.starts_with("/v1/")));
}

#[test]
fn mismatched_api_prefix_fails_first_creation() {
    let api = FakeRepostApi::new().with_api_prefix("/v1");
    let outcome = run_against(&api, &fake_config(41));
    match outcome.result {
        Err(HarnessError::UnexpectedStatus {
            method,
            actual,
            expected,
            ..
        }) => {
            assert_eq!(method, HttpMethod::Post);
            assert_eq!(actual, 404);
            assert_eq!(expected, 201);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}
