// crates/repost-conformance-runner/src/scenario/mod.rs
// ============================================================================
// Module: Scenario Driver
// Description: The ordered lifecycle script of a conformance run.
// Purpose: Compose entities, the request tester, and the vote tester.
// Dependencies: repost-conformance-core
// ============================================================================

//! ## Overview
//! One linear script over shared entity handles: accounts, communities,
//! posts, comments, moderation and removal, then account deletion. Each group
//! hands the handles it created to the next; the same community is created
//! once, transferred, edited, and finally deleted.
//! Invariants:
//! - Steps run strictly in order; the first failure ends the run.
//! - Every entity is created through the API before it is referenced by id.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod accounts;
pub mod comments;
pub mod communities;
pub mod posts;
pub mod removal;

// ============================================================================
// SECTION: Imports
// ============================================================================

use repost_conformance_core::User;

use crate::auth::AccessToken;
use crate::context::HarnessContext;
use crate::error::HarnessResult;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A registered user together with a live token.
#[derive(Debug, Clone)]
pub struct Account {
    /// Local mirror of the user.
    pub user: User,
    /// Token issued at login.
    pub token: AccessToken,
}

// ============================================================================
// SECTION: Driver
// ============================================================================

/// Runs the whole scenario against the server behind `ctx`.
///
/// # Errors
///
/// Returns the first [`crate::HarnessError`] raised by any step.
pub fn run_suite(ctx: &mut HarnessContext) -> HarnessResult<()> {
    let first = accounts::register(ctx)?;
    let (community, second) = communities::found(ctx, &first)?;
    let posts = posts::publish(ctx, &community, &first, &second)?;
    let threads = comments::discuss(ctx, &posts.first, &first, &second)?;
    let third = removal::moderate(ctx, &community, &posts, &threads, &first, &second)?;

    accounts::close(ctx, first)?;
    accounts::close(ctx, second)?;
    accounts::close(ctx, third)?;
    Ok(())
}
