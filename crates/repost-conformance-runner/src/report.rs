// crates/repost-conformance-runner/src/report.rs
// ============================================================================
// Module: Run Reporting
// Description: Per-run and multi-run timing summaries.
// Purpose: Aggregate executed test counts and wall-clock timings.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`RunSummary`] is produced by every successful run. Repeated runs are
//! folded into a [`MultiRunSummary`] with total, mean, and median timings.

use serde::Serialize;

/// Outcome of one successful run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    /// Executions performed, auth probes included.
    pub test_count: u64,
    /// Wall-clock duration in seconds.
    pub elapsed_seconds: f64,
}

/// Aggregate over several successful runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiRunSummary {
    /// Number of runs.
    pub runs: u32,
    /// Executions across all runs.
    pub test_count: u64,
    /// Sum of run durations in seconds.
    pub total_elapsed_seconds: f64,
    /// Mean run duration in seconds.
    pub mean_elapsed_seconds: f64,
    /// Median run duration in seconds.
    pub median_elapsed_seconds: f64,
    /// Individual runs in execution order.
    pub per_run: Vec<RunSummary>,
}

impl MultiRunSummary {
    /// Aggregates `runs`; returns `None` when there are none.
    #[must_use]
    pub fn from_runs(runs: &[RunSummary]) -> Option<Self> {
        let count = u32::try_from(runs.len()).ok().filter(|count| *count > 0)?;
        let total: f64 = runs.iter().map(|run| run.elapsed_seconds).sum();
        let mut sorted: Vec<f64> = runs.iter().map(|run| run.elapsed_seconds).collect();
        sorted.sort_by(f64::total_cmp);
        let middle = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            f64::midpoint(sorted[middle - 1], sorted[middle])
        } else {
            sorted[middle]
        };
        Some(Self {
            runs: count,
            test_count: runs.iter().map(|run| run.test_count).sum(),
            total_elapsed_seconds: total,
            mean_elapsed_seconds: total / f64::from(count),
            median_elapsed_seconds: median,
            per_run: runs.to_vec(),
        })
    }
}
