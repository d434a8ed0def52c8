// crates/repost-conformance-runner/src/scenario/accounts.rs
// ============================================================================
// Module: Account Scenarios
// Description: Registration, login, self-edit, and self-deletion of users.
// Purpose: Produce authenticated accounts for later groups and retire them.
// Dependencies: repost-conformance-core, reqwest, serde_json
// ============================================================================

//! `register` creates the first account and walks its login and self-edit
//! rules; `enroll` creates the later accounts with less ceremony. `close`
//! deletes an account and checks its name, credentials, and token are gone.

use repost_conformance_core::Entity;
use repost_conformance_core::User;
use reqwest::StatusCode;
use serde_json::json;

use super::Account;
use crate::context::HarnessContext;
use crate::contract::DELETED_STATUS;
use crate::contract::REVOKED_TOKEN_STATUS;
use crate::endpoint::Endpoint;
use crate::error::HarnessResult;
use crate::tester::TestCase;

/// Registers the first user and exercises login and self-editing.
///
/// # Errors
///
/// Returns the first failed assertion.
pub fn register(ctx: &mut HarnessContext) -> HarnessResult<Account> {
    let mut user = User::random(ctx.tokens());
    let username = user.username().to_string();

    ctx.step("Test get user1 before creation");
    ctx.test(TestCase::get(Endpoint::User(username.clone()), StatusCode::NOT_FOUND))?;

    ctx.step("Test create user1");
    let payload = user.create_payload();
    ctx.test(TestCase::post(Endpoint::Users, StatusCode::CREATED).json(payload.clone()).compare(&mut user))?;

    ctx.step("Test create user1 with same username");
    ctx.test(TestCase::post(Endpoint::Users, StatusCode::BAD_REQUEST).json(payload))?;

    ctx.step("Test login nonexistent user");
    let stranger = User::random(ctx.tokens());
    ctx.expect_login_rejected(stranger.username(), stranger.password())?;

    ctx.step("Test login invalid user1 password");
    let impostor = User::with_username(username.clone(), ctx.tokens());
    ctx.expect_login_rejected(impostor.username(), impostor.password())?;

    ctx.step("Test login user1");
    let token = ctx.login(&user)?;

    ctx.step("Test get user1");
    ctx.test(TestCase::get(Endpoint::User(username), StatusCode::OK).compare(&mut user))?;

    ctx.step("Test get current user with user1 token");
    ctx.test(TestCase::get(Endpoint::CurrentUser, StatusCode::OK).token(&token).compare(&mut user))?;

    let edits = [
        ("Test edit current user bio only", json!({"bio": "Custom bio"})),
        ("Test edit current user avatar_url only", json!({"avatar_url": "Custom url"})),
        (
            "Test edit current user bio and avatar_url",
            json!({"bio": "Custom bio 2", "avatar_url": "Custom url 2"}),
        ),
    ];
    for (label, changes) in edits {
        ctx.step(label);
        let body = user.edit(changes)?;
        ctx.test(
            TestCase::patch(Endpoint::CurrentUser, StatusCode::OK)
                .token(&token)
                .json(body)
                .compare(&mut user),
        )?;
    }

    Ok(Account {
        user,
        token,
    })
}

/// Creates and logs in an additional user.
///
/// # Errors
///
/// Returns the first failed assertion.
pub fn enroll(ctx: &mut HarnessContext, label: &str) -> HarnessResult<Account> {
    let mut user = User::random(ctx.tokens());

    ctx.step(format!("Test create {label}"));
    let payload = user.create_payload();
    ctx.test(TestCase::post(Endpoint::Users, StatusCode::CREATED).json(payload).compare(&mut user))?;

    ctx.step(format!("Test login {label}"));
    let token = ctx.login(&user)?;

    Ok(Account {
        user,
        token,
    })
}

/// Deletes the account and proves its name, credentials, and token are gone.
///
/// # Errors
///
/// Returns the first failed assertion.
pub fn close(ctx: &mut HarnessContext, account: Account) -> HarnessResult<()> {
    let Account {
        user,
        token,
    } = account;
    let username = user.username().to_string();

    ctx.step(format!("Test delete {username} as themselves"));
    ctx.test(TestCase::delete(Endpoint::CurrentUser, DELETED_STATUS).token(&token))?;

    ctx.step(format!("Test get {username} after deleting"));
    ctx.test(TestCase::get(Endpoint::User(username.clone()), StatusCode::NOT_FOUND))?;

    ctx.step(format!("Test login {username} after deleting"));
    ctx.expect_login_rejected(&username, user.password())?;

    ctx.step(format!("Test token of {username} is rejected after deleting"));
    ctx.test(
        TestCase::get(Endpoint::CurrentUser, REVOKED_TOKEN_STATUS).token(&token).skip_auth_probe(),
    )?;
    Ok(())
}
