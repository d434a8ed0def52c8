// crates/repost-conformance-runner/src/log.rs
// ============================================================================
// Module: Run Logging
// Description: Structured run events and the sinks that record them.
// Purpose: Report progress without binding the harness to one log pipeline.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The harness emits a [`RunEvent`] for every scenario step and every HTTP
//! execution, auth probes included. Sinks decide how (or whether) to render
//! them: human-readable progress lines, JSON lines, nothing, or an in-memory
//! buffer for tests.
//! Invariants:
//! - Recording never fails the run; sink errors are swallowed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;

use crate::endpoint::HttpMethod;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Which execution of a test case produced a request event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// The primary call with the caller's credentials.
    Primary,
    /// Probe without an `Authorization` header.
    MissingToken,
    /// Probe with a malformed bearer token.
    MalformedToken,
}

/// Structured run event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// A run started.
    RunStarted {
        /// Zero-based run index.
        run: u32,
        /// Target base URL.
        base_url: String,
        /// Seed for the run's token generator, when deterministic.
        seed: Option<u64>,
    },
    /// A scenario step started.
    Step {
        /// Step description.
        label: String,
    },
    /// One HTTP execution completed with the expected status.
    Request {
        /// Execution number within the run (1-based).
        sequence: u64,
        /// Primary call or probe.
        call: CallKind,
        /// HTTP method.
        method: HttpMethod,
        /// Rendered endpoint path.
        path: String,
        /// Observed status code.
        status: u16,
        /// Round-trip time in milliseconds.
        elapsed_ms: u64,
    },
    /// A run completed successfully.
    RunFinished {
        /// Zero-based run index.
        run: u32,
        /// Executed test count.
        test_count: u64,
        /// Wall-clock duration in seconds.
        elapsed_seconds: f64,
    },
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for run events.
pub trait RunLog: Send + Sync {
    /// Records one event.
    fn record(&self, event: &RunEvent);
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Human-readable progress lines on stderr.
pub struct StderrRunLog;

impl RunLog for StderrRunLog {
    fn record(&self, event: &RunEvent) {
        let line = match event {
            RunEvent::RunStarted {
                run,
                base_url,
                ..
            } => format!("Run {} against {base_url}", run + 1),
            RunEvent::Step {
                label,
            } => label.clone(),
            RunEvent::Request {
                call: CallKind::MissingToken,
                ..
            } => "\tWithout authorization".to_string(),
            RunEvent::Request {
                call: CallKind::MalformedToken,
                ..
            } => "\tWith invalid token".to_string(),
            RunEvent::Request {
                call: CallKind::Primary,
                ..
            }
            | RunEvent::RunFinished {
                ..
            } => return,
        };
        let _ = writeln!(std::io::stderr(), "{line}");
    }
}

/// One JSON object per event on stderr.
pub struct JsonLinesRunLog;

impl RunLog for JsonLinesRunLog {
    fn record(&self, event: &RunEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Discards every event.
pub struct NoopRunLog;

impl RunLog for NoopRunLog {
    fn record(&self, _event: &RunEvent) {}
}

/// Buffers events in memory.
#[derive(Default)]
pub struct MemoryRunLog {
    /// Recorded events in order.
    events: Mutex<Vec<RunEvent>>,
}

impl MemoryRunLog {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl RunLog for MemoryRunLog {
    fn record(&self, event: &RunEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
