// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared run fixtures for system-test binaries.
// Purpose: Drive full harness runs against the in-process Repost server.
// Dependencies: system-tests, repost-conformance-runner
// ============================================================================

//! ## Overview
//! Each test binary includes this module with `mod helpers;`. Not every
//! binary uses every helper.

#![allow(dead_code, reason = "Helpers are shared across test binaries.")]

use std::sync::Arc;

use repost_conformance_runner::HarnessConfig;
use repost_conformance_runner::HarnessResult;
use repost_conformance_runner::HttpMethod;
use repost_conformance_runner::MemoryRunLog;
use repost_conformance_runner::RunEvent;
use repost_conformance_runner::RunLog;
use repost_conformance_runner::RunSummary;
use repost_conformance_runner::log::CallKind;
use repost_conformance_runner::run_once;
use system_tests::fake_api::FakeRepostApi;

/// Outcome of one in-process run.
pub struct Outcome {
    /// Result returned by the harness.
    pub result: HarnessResult<RunSummary>,
    /// Events recorded during the run.
    pub events: Vec<RunEvent>,
}

/// Runs the scenario once against `api` with an in-memory log.
pub fn run_against(api: &FakeRepostApi, config: &HarnessConfig) -> Outcome {
    let log = Arc::new(MemoryRunLog::new());
    let sink: Arc<dyn RunLog> = log.clone();
    let result = run_once(config, api.transport(), sink, 0);
    Outcome {
        result,
        events: log.events(),
    }
}

/// Request events as `(call, method, path)` triples.
pub fn requests_of(events: &[RunEvent]) -> Vec<(CallKind, HttpMethod, String)> {
    events
        .iter()
        .filter_map(|event| match event {
            RunEvent::Request {
                call,
                method,
                path,
                ..
            } => Some((*call, *method, path.clone())),
            _ => None,
        })
        .collect()
}
