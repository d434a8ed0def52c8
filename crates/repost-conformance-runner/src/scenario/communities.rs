// crates/repost-conformance-runner/src/scenario/communities.rs
// ============================================================================
// Module: Community Scenarios
// Description: Creation, listing, owner edits, and ownership transfer.
// Purpose: Leave one community owned by the second account.
// Dependencies: repost-conformance-core, reqwest, serde_json
// ============================================================================

//! The first account founds a community, the second account is enrolled,
//! and ownership moves to it. After the transfer only the new owner may
//! edit, and the owner listings follow the move.

use repost_conformance_core::Community;
use repost_conformance_core::Entity;
use repost_conformance_core::User;
use reqwest::StatusCode;
use serde_json::json;

use super::Account;
use super::accounts;
use crate::context::HarnessContext;
use crate::endpoint::Endpoint;
use crate::endpoint::UserResource;
use crate::error::HarnessResult;
use crate::tester::TestCase;

/// Creates a community as `first`, then transfers it to a new second account.
///
/// Returns the community (now owned by the second account) and that account.
///
/// # Errors
///
/// Returns the first failed assertion.
pub fn found(ctx: &mut HarnessContext, first: &Account) -> HarnessResult<(Community, Account)> {
    let owner = first.user.username().to_string();

    ctx.step("Test get communities is list");
    ctx.listing(Endpoint::Communities)?;

    let mut community = Community::random(owner.clone(), ctx.tokens());
    let name = community.name().to_string();

    ctx.step("Test get community1 before creation");
    ctx.test(TestCase::get(Endpoint::Community(name.clone()), StatusCode::NOT_FOUND))?;

    ctx.step("Test create community1");
    let payload = community.create_payload();
    ctx.test(
        TestCase::post(Endpoint::Communities, StatusCode::CREATED)
            .token(&first.token)
            .json(payload.clone())
            .compare(&mut community),
    )?;

    ctx.step("Test create community1 with same name");
    ctx.test(
        TestCase::post(Endpoint::Communities, StatusCode::BAD_REQUEST)
            .token(&first.token)
            .json(payload),
    )?;

    ctx.step("Test community1 in get communities");
    ctx.expect_listed(Endpoint::Communities, &community)?;

    ctx.step("Test get community1");
    ctx.test(TestCase::get(Endpoint::Community(name.clone()), StatusCode::OK).compare(&mut community))?;

    ctx.step("Test get user1 communities has community1");
    ctx.expect_listed(Endpoint::UserResources(owner.clone(), UserResource::Communities), &community)?;

    ctx.step("Test edit nonexistent community description as user1");
    let missing = Community::random(owner.clone(), ctx.tokens());
    let body = community.edit_payload(json!({"description": "Nonexistent description"}))?;
    ctx.test(
        TestCase::patch(Endpoint::Community(missing.name().to_string()), StatusCode::NOT_FOUND)
            .token(&first.token)
            .json(body),
    )?;

    ctx.step("Test edit community1 description as user1");
    let body = community.edit(json!({"description": "User1 description"}))?;
    ctx.test(
        TestCase::patch(Endpoint::Community(name.clone()), StatusCode::OK)
            .token(&first.token)
            .json(body)
            .compare(&mut community),
    )?;

    ctx.step("Test transfer community1 ownership to nonexistent user");
    let nobody = User::random(ctx.tokens());
    let body = community.edit_payload(json!({"new_owner_username": nobody.username()}))?;
    ctx.test(
        TestCase::patch(Endpoint::Community(name.clone()), StatusCode::NOT_FOUND)
            .token(&first.token)
            .json(body),
    )?;

    let second = accounts::enroll(ctx, "user2")?;
    let heir = second.user.username().to_string();

    ctx.step("Test edit community1 description as user2");
    let body = community.edit_payload(json!({"description": "User2 description"}))?;
    ctx.test(
        TestCase::patch(Endpoint::Community(name.clone()), StatusCode::FORBIDDEN)
            .token(&second.token)
            .json(body),
    )?;

    ctx.step("Test get user2 communities does not have community1 before transfer");
    ctx.expect_not_listed(Endpoint::UserResources(heir.clone(), UserResource::Communities), &community)?;

    ctx.step("Test transfer community1 ownership to user2");
    let body = community.edit(json!({"new_owner_username": heir.clone()}))?;
    ctx.test(
        TestCase::patch(Endpoint::Community(name.clone()), StatusCode::OK)
            .token(&first.token)
            .json(body)
            .compare(&mut community),
    )?;

    ctx.step("Test edit community1 description as user1 when user2 is owner");
    let body = community.edit_payload(json!({"description": "User1 description 2"}))?;
    ctx.test(
        TestCase::patch(Endpoint::Community(name.clone()), StatusCode::FORBIDDEN)
            .token(&first.token)
            .json(body),
    )?;

    ctx.step("Test edit community1 description as user2 when user2 is owner");
    let body = community.edit(json!({"description": "User2 description 2"}))?;
    ctx.test(
        TestCase::patch(Endpoint::Community(name), StatusCode::OK)
            .token(&second.token)
            .json(body)
            .compare(&mut community),
    )?;

    ctx.step("Test get user2 communities has community1 when user2 is owner");
    ctx.expect_listed(Endpoint::UserResources(heir, UserResource::Communities), &community)?;

    ctx.step("Test get user1 communities no longer has community1");
    ctx.expect_not_listed(Endpoint::UserResources(owner, UserResource::Communities), &community)?;

    Ok((community, second))
}
