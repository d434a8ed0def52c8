// crates/repost-conformance-runner/src/run.rs
// ============================================================================
// Module: Run Orchestration
// Description: Single and repeated conformance runs over a transport.
// Purpose: Wire configuration, transport, logging, and the scenario driver.
// Dependencies: repost-conformance-core
// ============================================================================

//! ## Overview
//! [`run_once`] builds a fresh [`HarnessContext`] and runs the scenario once;
//! [`run_many`] repeats that with a new transport per run. With a base seed,
//! run `n` uses `seed + n` so repeated runs never reuse usernames; without
//! one each run draws from OS entropy.

use std::sync::Arc;
use std::time::Instant;

use repost_conformance_core::TokenGenerator;

use crate::config::HarnessConfig;
use crate::config::LogFormat;
use crate::context::HarnessContext;
use crate::endpoint::EndpointResolver;
use crate::error::HarnessError;
use crate::error::HarnessResult;
use crate::error::RunFailure;
use crate::log::JsonLinesRunLog;
use crate::log::NoopRunLog;
use crate::log::RunEvent;
use crate::log::RunLog;
use crate::log::StderrRunLog;
use crate::report::RunSummary;
use crate::scenario::run_suite;
use crate::tester::RequestTester;
use crate::transport::HttpTransport;
use crate::transport::Transport;
use crate::transport::TransportError;

/// Returns the sink for a log format.
#[must_use]
pub fn run_log_for(format: LogFormat) -> Arc<dyn RunLog> {
    match format {
        LogFormat::Text => Arc::new(StderrRunLog),
        LogFormat::Json => Arc::new(JsonLinesRunLog),
        LogFormat::Off => Arc::new(NoopRunLog),
    }
}

/// Builds the reqwest transport described by `config`.
///
/// # Errors
///
/// Returns [`TransportError::Client`] when the client cannot be built.
pub fn http_transport(config: &HarnessConfig) -> Result<Box<dyn Transport>, TransportError> {
    let transport = HttpTransport::new(config.timeout, config.follow_redirects)?;
    Ok(Box::new(transport))
}

/// Returns the seed used by run `run`, if deterministic.
#[must_use]
pub fn run_seed(base: Option<u64>, run: u32) -> Option<u64> {
    base.map(|seed| seed.wrapping_add(u64::from(run)))
}

/// Runs the scenario once.
///
/// # Errors
///
/// Returns [`crate::HarnessError`] on a missing base URL or the first
/// failed step.
pub fn run_once(
    config: &HarnessConfig,
    transport: Box<dyn Transport>,
    log: Arc<dyn RunLog>,
    run: u32,
) -> HarnessResult<RunSummary> {
    let base_url = config.require_base_url()?;
    let seed = run_seed(config.seed, run);
    let tokens = seed.map_or_else(TokenGenerator::from_entropy, TokenGenerator::from_seed);
    let endpoints = EndpointResolver::new(base_url, &config.api_prefix, config.trailing_slash);
    let tester = RequestTester::new(transport, endpoints, Arc::clone(&log));
    let mut ctx = HarnessContext::new(tester, tokens, Arc::clone(&log));

    log.record(&RunEvent::RunStarted {
        run,
        base_url: base_url.to_string(),
        seed,
    });
    let started = Instant::now();
    run_suite(&mut ctx)?;
    let summary = RunSummary {
        test_count: ctx.test_count(),
        elapsed_seconds: started.elapsed().as_secs_f64(),
    };
    log.record(&RunEvent::RunFinished {
        run,
        test_count: summary.test_count,
        elapsed_seconds: summary.elapsed_seconds,
    });
    Ok(summary)
}

/// Runs the scenario `runs` times, building a transport per run.
///
/// `on_run` sees each passing run's zero-based index and summary before the
/// next run starts. Stops at the first failing run.
///
/// # Errors
///
/// Returns [`RunFailure`] naming the first failing run.
pub fn run_many<F, R>(
    config: &HarnessConfig,
    runs: u32,
    log: &Arc<dyn RunLog>,
    mut transport: F,
    mut on_run: R,
) -> Result<Vec<RunSummary>, RunFailure>
where
    F: FnMut() -> Result<Box<dyn Transport>, TransportError>,
    R: FnMut(u32, &RunSummary),
{
    let mut summaries = Vec::new();
    for run in 0 .. runs {
        let summary = transport()
            .map_err(HarnessError::from)
            .and_then(|transport| run_once(config, transport, Arc::clone(log), run))
            .map_err(|source| RunFailure {
                number: run + 1,
                source,
            })?;
        on_run(run, &summary);
        summaries.push(summary);
    }
    Ok(summaries)
}
