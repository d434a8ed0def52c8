// crates/repost-conformance-runner/src/scenario/posts.rs
// ============================================================================
// Module: Post Scenarios
// Description: Post creation, duplicate submission, edits, and voting.
// Purpose: Leave three live posts in the community for later groups.
// Dependencies: repost-conformance-core, reqwest, serde_json
// ============================================================================

//! Posts are created in the transferred community by both accounts. A
//! resubmitted post must get its own id. Edits and the vote sequence run
//! against the first post.

use repost_conformance_core::Community;
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

/// Posts created by [`publish`].
#[derive(Debug, Clone)]
pub struct Posts {
    /// Post by the first account; edited and voted on.
    pub first: Post,
    /// Second submission of the first post's original content.
    pub first_copy: Post,
    /// Post by the second account.
    pub second: Post,
}

/// Publishes and edits posts in `community`.
///
/// # Errors
///
/// Returns the first failed assertion.
pub fn publish(
    ctx: &mut HarnessContext,
    community: &Community,
    first: &Account,
    second: &Account,
) -> HarnessResult<Posts> {
    let name = community.name().to_string();
    let author = first.user.username().to_string();

    ctx.step("Test get posts in community1 is list");
    ctx.listing(Endpoint::CommunityPosts(name.clone()))?;

    ctx.step("Test get posts in nonexistent community");
    let missing = Community::random(author.clone(), ctx.tokens());
    ctx.test(TestCase::get(
        Endpoint::CommunityPosts(missing.name().to_string()),
        StatusCode::NOT_FOUND,
    ))?;

    let mut post1 = Post::random(author.clone(), name.clone(), ctx.tokens());

    ctx.step("Test create post in nonexistent community");
    ctx.test(
        TestCase::post(Endpoint::CommunityPosts(missing.name().to_string()), StatusCode::NOT_FOUND)
            .token(&first.token)
            .json(post1.create_payload()),
    )?;

    ctx.step("Test create post1 in community1 as user1");
    ctx.test(
        TestCase::post(Endpoint::CommunityPosts(name.clone()), StatusCode::CREATED)
            .token(&first.token)
            .json(post1.create_payload())
            .compare(&mut post1),
    )?;
    let post1_id = post1.confirmed_id()?;

    ctx.step("Test get post1");
    ctx.test(TestCase::get(Endpoint::Post(post1_id), StatusCode::OK).compare(&mut post1))?;

    let mut post1_copy = post1.clone();
    post1_copy.id = None;

    ctx.step("Test create same post in community1 as user1");
    ctx.test(
        TestCase::post(Endpoint::CommunityPosts(name.clone()), StatusCode::CREATED)
            .token(&first.token)
            .json(post1_copy.create_payload())
            .compare(&mut post1_copy),
    )?;
    let copy_id = post1_copy.confirmed_id()?;
    if copy_id == post1_id {
        return Err(HarnessError::DuplicateIdentity {
            kind: Post::KIND,
            id: copy_id,
        });
    }

    ctx.step("Test get post1_copy");
    ctx.test(TestCase::get(Endpoint::Post(copy_id), StatusCode::OK).compare(&mut post1_copy))?;

    ctx.step("Test get posts in community1 has both post1");
    ctx.expect_listed(Endpoint::CommunityPosts(name.clone()), &post1)?;
    ctx.expect_listed(Endpoint::CommunityPosts(name.clone()), &post1_copy)?;

    let mut post2 = Post::random(second.user.username(), name.clone(), ctx.tokens());

    ctx.step("Test create post2 in community1 as user2");
    ctx.test(
        TestCase::post(Endpoint::CommunityPosts(name), StatusCode::CREATED)
            .token(&second.token)
            .json(post2.create_payload())
            .compare(&mut post2),
    )?;
    let post2_id = post2.confirmed_id()?;

    ctx.step("Test get post2");
    ctx.test(TestCase::get(Endpoint::Post(post2_id), StatusCode::OK).compare(&mut post2))?;

    ctx.step("Test get nonexistent post");
    ctx.test(TestCase::get(Endpoint::Post(NONEXISTENT_ID), StatusCode::NOT_FOUND))?;

    ctx.step("Test get user1 posts has post1");
    ctx.expect_listed(Endpoint::UserResources(author, UserResource::Posts), &post1)?;

    let edits = [
        ("Test user1 edit post1 title", json!({"title": "Custom title"})),
        ("Test user1 add content to post1", json!({"content": "Custom content"})),
        ("Test user1 add url to post1 and remove content", json!({"content": null, "url": "Custom url"})),
        (
            "Test user1 change post1 content and url",
            json!({"content": "Custom content 2", "url": "Custom url 2"}),
        ),
    ];
    for (label, changes) in edits {
        ctx.step(label);
        let body = post1.edit(changes)?;
        ctx.test(
            TestCase::patch(Endpoint::Post(post1_id), StatusCode::OK)
                .token(&first.token)
                .json(body)
                .compare(&mut post1),
        )?;
    }

    ctx.step("Test user2 edit post1 title");
    let body = post1.edit_payload(json!({"title": "User2 title"}))?;
    ctx.test(
        TestCase::patch(Endpoint::Post(post1_id), StatusCode::FORBIDDEN)
            .token(&second.token)
            .json(body),
    )?;

    ctx.step("Test user1 set post1 title to null");
    let body = post1.edit_payload(json!({"title": null}))?;
    ctx.test(
        TestCase::patch(Endpoint::Post(post1_id), StatusCode::UNPROCESSABLE_ENTITY)
            .token(&first.token)
            .json(body),
    )?;

    exercise_votes(ctx, &mut post1, &first.token, &second.token)?;

    Ok(Posts {
        first: post1,
        first_copy: post1_copy,
        second: post2,
    })
}
