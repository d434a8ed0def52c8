// system-tests/tests/suites/divergence.rs
// ============================================================================
// Module: Divergence Tests
// Description: Runs against servers that break one rule of the contract.
// Purpose: Ensure each deviation stops the run with a precise diagnostic.
// Dependencies: system-tests, repost-conformance-runner
// ============================================================================

//! ## Overview
//! Each test enables one server quirk and checks the error that ends the
//! run, plus that nothing ran after the failing request.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use repost_conformance_runner::HarnessError;
use repost_conformance_runner::RunEvent;
use system_tests::fake_api::FakeRepostApi;
use system_tests::fake_api::Quirk;
use system_tests::fake_config;

use crate::helpers::Outcome;
use crate::helpers::run_against;

fn run_with(quirk: Quirk) -> Outcome {
    run_against(&FakeRepostApi::with_quirks(&[quirk]), &fake_config(21))
}

fn assert_no_finish(outcome: &Outcome) {
    assert!(
        !outcome.events.iter().any(|event| matches!(event, RunEvent::RunFinished { .. })),
        "run must not finish"
    );
}

#[test]
fn malformed_token_answered_with_bad_request_fails_probe() {
    let outcome = run_with(Quirk::MalformedTokenBadRequest);
    match &outcome.result {
        Err(HarnessError::UnexpectedStatus {
            actual,
            expected,
            body,
            ..
        }) => {
            assert_eq!(*actual, 400);
            assert_eq!(*expected, 401);
            assert!(body.contains("detail"), "body: {body}");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_no_finish(&outcome);
}

#[test]
fn accumulating_votes_fail_entity_comparison() {
    let outcome = run_with(Quirk::VotesAccumulate);
    match &outcome.result {
        Err(HarnessError::EntityMismatch {
            kind,
            actual,
            expected,
            ..
        }) => {
            assert_eq!(*kind, "post");
            assert_ne!(actual["votes"], expected["votes"]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_no_finish(&outcome);
}

#[test]
fn surviving_tokens_fail_revocation_check() {
    let outcome = run_with(Quirk::TokensSurviveDeletion);
    match &outcome.result {
        Err(HarnessError::UnexpectedStatus {
            path,
            actual,
            expected,
            ..
        }) => {
            assert_eq!(*expected, 401);
            assert_eq!(*actual, 404);
            assert!(path.ends_with("/users/me"), "path: {path}");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_no_finish(&outcome);
}

#[test]
fn shared_identifiers_fail_duplicate_check() {
    let outcome = run_with(Quirk::DuplicatesShareId);
    match &outcome.result {
        Err(HarnessError::DuplicateIdentity {
            kind, ..
        }) => assert_eq!(*kind, "post"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_no_finish(&outcome);
}

#[test]
fn failure_message_reports_status_and_body() {
    let outcome = run_with(Quirk::MalformedTokenBadRequest);
    let message = outcome.result.expect_err("quirk must fail").to_string();
    assert!(message.contains("Got status code 400"), "message: {message}");
    assert!(message.contains("Expected 401"), "message: {message}");
    assert!(message.contains("Response: "), "message: {message}");
}
