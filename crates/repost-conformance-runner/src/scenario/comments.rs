// crates/repost-conformance-runner/src/scenario/comments.rs
// ============================================================================
// Module: Comment Scenarios
// Description: Comments, duplicate submission, replies, edits, and voting.
// Purpose: Leave a small comment thread on the first post.
// Dependencies: repost-conformance-core, reqwest, serde_json
// ============================================================================

//! Comments from both accounts and one reply are made on the first post.
//! Resubmitting identical content must yield a new id. Edits, listings, and
//! the vote sequence run against the first comment.

use repost_conformance_core::Comment;
use repost_conformance_core::Entity;
use repost_conformance_core::Post;
use repost_conformance_core::Votable;
use reqwest::StatusCode;
use serde_json::json;

use super::Account;
use crate::context::HarnessContext;
use crate::contract::NONEXISTENT_ID;
use crate::endpoint::Endpoint;
use crate::endpoint::UserResource;
use crate::error::HarnessError;
use crate::error::HarnessResult;
use crate::tester::TestCase;
use crate::votes::exercise_votes;

/// Comments created by [`discuss`].
#[derive(Debug, Clone)]
pub struct Threads {
    /// Comment by the first account; edited and voted on.
    pub first: Comment,
    /// Second submission of the first comment's original content.
    pub first_copy: Comment,
    /// Comment by the second account.
    pub second: Comment,
    /// Reply by the second account to the first comment.
    pub reply: Comment,
}

/// Builds a comment thread on `post`.
///
/// # Errors
///
/// Returns the first failed assertion.
pub fn discuss(
    ctx: &mut HarnessContext,
    post: &Post,
    first: &Account,
    second: &Account,
) -> HarnessResult<Threads> {
    let post_id = post.confirmed_id()?;
    let community = post.parent_community_name.clone();
    let author = first.user.username().to_string();

    ctx.step("Test get comments from post1 is list");
    ctx.listing(Endpoint::PostComments(post_id))?;

    ctx.step("Test get comments from nonexistent post");
    ctx.test(TestCase::get(Endpoint::PostComments(NONEXISTENT_ID), StatusCode::NOT_FOUND))?;

    let mut comment1 = Comment::random(author.clone(), community.clone(), post_id, ctx.tokens());

    ctx.step("Test create comment on nonexistent post");
    ctx.test(
        TestCase::post(Endpoint::PostComments(NONEXISTENT_ID), StatusCode::NOT_FOUND)
            .token(&first.token)
            .json(comment1.create_payload()),
    )?;

    ctx.step("Test create comment1 on post1 as user1");
    ctx.test(
        TestCase::post(Endpoint::PostComments(post_id), StatusCode::CREATED)
            .token(&first.token)
            .json(comment1.create_payload())
            .compare(&mut comment1),
    )?;
    let comment1_id = comment1.confirmed_id()?;

    let mut comment1_copy = comment1.clone();
    comment1_copy.id = None;

    ctx.step("Test create same comment on post1 as user1");
    ctx.test(
        TestCase::post(Endpoint::PostComments(post_id), StatusCode::CREATED)
            .token(&first.token)
            .json(comment1_copy.create_payload())
            .compare(&mut comment1_copy),
    )?;
    let copy_id = comment1_copy.confirmed_id()?;
    if copy_id == comment1_id {
        return Err(HarnessError::DuplicateIdentity {
            kind: Comment::KIND,
            id: copy_id,
        });
    }

    ctx.step("Test get comments on post1 has both comment1");
    ctx.expect_listed(Endpoint::PostComments(post_id), &comment1)?;
    ctx.expect_listed(Endpoint::PostComments(post_id), &comment1_copy)?;

    ctx.step("Test get user1 comments has comment1");
    ctx.expect_listed(Endpoint::UserResources(author, UserResource::Comments), &comment1)?;

    let mut comment2 = Comment::random(second.user.username(), community, post_id, ctx.tokens());

    ctx.step("Test create comment2 on post1 as user2");
    ctx.test(
        TestCase::post(Endpoint::PostComments(post_id), StatusCode::CREATED)
            .token(&second.token)
            .json(comment2.create_payload())
            .compare(&mut comment2),
    )?;

    let mut reply = Comment::reply_to(second.user.username(), &comment1, ctx.tokens())?;

    ctx.step("Test create reply to comment1 as user2");
    ctx.test(
        TestCase::post(Endpoint::Comment(comment1_id), StatusCode::CREATED)
            .token(&second.token)
            .json(reply.create_payload())
            .compare(&mut reply),
    )?;
    let reply_id = reply.confirmed_id()?;

    ctx.step("Test get reply");
    ctx.test(TestCase::get(Endpoint::Comment(reply_id), StatusCode::OK).compare(&mut reply))?;

    ctx.step("Test create reply to nonexistent comment");
    ctx.test(
        TestCase::post(Endpoint::Comment(NONEXISTENT_ID), StatusCode::NOT_FOUND)
            .token(&second.token)
            .json(reply.create_payload()),
    )?;

    ctx.step("Test edit comment1 content as user1");
    let body = comment1.edit(json!({"content": "Custom content"}))?;
    ctx.test(
        TestCase::patch(Endpoint::Comment(comment1_id), StatusCode::OK)
            .token(&first.token)
            .json(body)
            .compare(&mut comment1),
    )?;

    ctx.step("Test set comment1 content to null");
    let body = comment1.edit_payload(json!({"content": null}))?;
    ctx.test(
        TestCase::patch(Endpoint::Comment(comment1_id), StatusCode::UNPROCESSABLE_ENTITY)
            .token(&first.token)
            .json(body),
    )?;

    ctx.step("Test edit comment1 as user2");
    let body = comment1.edit_payload(json!({"content": "User2 content"}))?;
    ctx.test(
        TestCase::patch(Endpoint::Comment(comment1_id), StatusCode::FORBIDDEN)
            .token(&second.token)
            .json(body),
    )?;

    exercise_votes(ctx, &mut comment1, &first.token, &second.token)?;

    Ok(Threads {
        first: comment1,
        first_copy: comment1_copy,
        second: comment2,
        reply,
    })
}
