// crates/repost-conformance-runner/src/votes.rs
// ============================================================================
// Module: Vote Sequence Tester
// Description: Single-active-vote model and the fixed vote scenario.
// Purpose: Exercise the server vote state machine on any votable entity.
// Dependencies: repost-conformance-core, reqwest, thiserror
// ============================================================================

//! ## Overview
//! A voter holds at most one active vote per target. The total is the sum of
//! each voter's latest value, so repeating a value changes nothing and
//! switching applies `new - old`. [`VoteLedger`] computes that model and
//! [`exercise_votes`] drives it against the server, checking the model
//! against the fixed [`VOTE_SEQUENCE`] table before every step.
//! Invariants:
//! - Values outside `-1..=1` are rejected and leave totals unchanged.

use std::collections::BTreeMap;

use repost_conformance_core::Comment;
use repost_conformance_core::Post;
use repost_conformance_core::Votable;
use reqwest::StatusCode;
use thiserror::Error;

use crate::auth::AccessToken;
use crate::context::HarnessContext;
use crate::contract::VOTE_ACCEPTED_STATUS;
use crate::contract::VOTE_RANGE;
use crate::endpoint::Endpoint;
use crate::error::HarnessError;
use crate::error::HarnessResult;
use crate::tester::TestCase;

// ============================================================================
// SECTION: Sequence
// ============================================================================

/// One of the two voters in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Voter {
    /// First voter.
    First,
    /// Second voter.
    Second,
}

impl Voter {
    /// Returns a label for step descriptions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Second => "second",
        }
    }
}

/// One vote submission and the total expected after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteStep {
    /// Who votes.
    pub voter: Voter,
    /// Submitted value.
    pub delta: i64,
    /// Aggregate total after the submission.
    pub expected_total: i64,
}

const fn step(voter: Voter, delta: i64, expected_total: i64) -> VoteStep {
    VoteStep {
        voter,
        delta,
        expected_total,
    }
}

/// The fixed valid vote sequence.
pub const VOTE_SEQUENCE: [VoteStep; 7] = [
    step(Voter::First, 0, 0),
    step(Voter::First, -1, -1),
    step(Voter::First, -1, -1),
    step(Voter::Second, -1, -2),
    step(Voter::First, 1, 0),
    step(Voter::Second, 0, 1),
    step(Voter::Second, 1, 2),
];

/// Values the server must reject with 422.
pub const OUT_OF_RANGE_DELTAS: [i64; 2] = [2, -2];

// ============================================================================
// SECTION: Ledger
// ============================================================================

/// Vote values the model refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VoteRejected {
    /// The value is outside `-1..=1`.
    #[error("vote value {0} is outside -1..=1")]
    OutOfRange(i64),
}

/// Latest vote value per voter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteLedger {
    /// Active value per voter; absent voters count as 0.
    latest: BTreeMap<Voter, i64>,
}

impl VoteLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `voter`'s new value and returns the resulting total.
    ///
    /// # Errors
    ///
    /// Returns [`VoteRejected::OutOfRange`] and leaves the ledger unchanged
    /// for values outside `-1..=1`.
    pub fn cast(&mut self, voter: Voter, value: i64) -> Result<i64, VoteRejected> {
        if !VOTE_RANGE.contains(&value) {
            return Err(VoteRejected::OutOfRange(value));
        }
        self.latest.insert(voter, value);
        Ok(self.total())
    }

    /// Returns the sum of every voter's latest value.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.latest.values().sum()
    }
}

// ============================================================================
// SECTION: Targets
// ============================================================================

/// Votable entities with their resource and vote routes.
pub trait VoteTarget: Votable {
    /// Route that reads the entity.
    fn resource_endpoint(id: u64) -> Endpoint;

    /// Route that submits a vote value.
    fn vote_endpoint(id: u64, delta: i64) -> Endpoint;
}

impl VoteTarget for Post {
    fn resource_endpoint(id: u64) -> Endpoint {
        Endpoint::Post(id)
    }

    fn vote_endpoint(id: u64, delta: i64) -> Endpoint {
        Endpoint::PostVote(id, delta)
    }
}

impl VoteTarget for Comment {
    fn resource_endpoint(id: u64) -> Endpoint {
        Endpoint::Comment(id)
    }

    fn vote_endpoint(id: u64, delta: i64) -> Endpoint {
        Endpoint::CommentVote(id, delta)
    }
}

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// Runs the out-of-range checks and the fixed sequence against `target`.
///
/// `target` must be freshly created (total 0) and confirmed.
///
/// # Errors
///
/// Returns [`HarnessError`] on the first failed call or when the ledger and
/// the fixed table disagree.
pub fn exercise_votes<T: VoteTarget>(
    ctx: &mut HarnessContext,
    target: &mut T,
    first: &AccessToken,
    second: &AccessToken,
) -> HarnessResult<()> {
    let id = target.confirmed_id()?;
    let kind = T::KIND;

    for delta in OUT_OF_RANGE_DELTAS {
        ctx.step(format!("Test vote {delta} on {kind} is rejected"));
        ctx.test(
            TestCase::post(T::vote_endpoint(id, delta), StatusCode::UNPROCESSABLE_ENTITY)
                .token(first),
        )?;
        ctx.test(TestCase::get(T::resource_endpoint(id), StatusCode::OK).compare(&mut *target))?;
    }

    let mut ledger = VoteLedger::new();
    for (index, vote) in VOTE_SEQUENCE.iter().enumerate() {
        let total = ledger.cast(vote.voter, vote.delta)?;
        if total != vote.expected_total {
            return Err(HarnessError::VoteModel {
                step: index,
                ledger: total,
                table: vote.expected_total,
            });
        }
        target.set_votes(total);
        let token = match vote.voter {
            Voter::First => first,
            Voter::Second => second,
        };
        ctx.step(format!("Test {} voter votes {} on {kind}", vote.voter.as_str(), vote.delta));
        ctx.test(
            TestCase::post(T::vote_endpoint(id, vote.delta), VOTE_ACCEPTED_STATUS)
                .token(token)
                .compare(&mut *target),
        )?;
        ctx.step(format!("Test {kind} vote total is {total}"));
        ctx.test(TestCase::get(T::resource_endpoint(id), StatusCode::OK).compare(&mut *target))?;
    }
    Ok(())
}
