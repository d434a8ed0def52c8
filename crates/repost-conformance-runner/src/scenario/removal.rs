// crates/repost-conformance-runner/src/scenario/removal.rs
// ============================================================================
// Module: Moderation and Removal Scenarios
// Description: Deletion rights and post-deletion visibility.
// Purpose: Prove only authors and community owners can remove content.
// Dependencies: repost-conformance-core, reqwest
// ============================================================================

//! Comments go first, then posts, then the community. Each deletion is
//! followed by a 404 read and listing checks on every listing that used to
//! contain the entity.

use repost_conformance_core::Community;
use repost_conformance_core::Votable;
use reqwest::StatusCode;

use super::Account;
use super::accounts;
use super::comments::Threads;
use super::posts::Posts;
use crate::context::HarnessContext;
use crate::contract::DELETED_STATUS;
use crate::endpoint::Endpoint;
use crate::endpoint::UserResource;
use crate::error::HarnessResult;
use crate::tester::TestCase;

/// Deletes the thread, the posts, and the community.
///
/// Returns the third account created to probe deletion rights.
///
/// # Errors
///
/// Returns the first failed assertion.
pub fn moderate(
    ctx: &mut HarnessContext,
    community: &Community,
    posts: &Posts,
    threads: &Threads,
    first: &Account,
    second: &Account,
) -> HarnessResult<Account> {
    let third = accounts::enroll(ctx, "user3")?;
    remove_comments(ctx, posts, threads, first, second, &third)?;
    remove_posts(ctx, community, posts, first, second, &third)?;
    remove_community(ctx, community, first, second)?;
    Ok(third)
}

fn remove_comments(
    ctx: &mut HarnessContext,
    posts: &Posts,
    threads: &Threads,
    first: &Account,
    second: &Account,
    third: &Account,
) -> HarnessResult<()> {
    let post_id = posts.first.confirmed_id()?;
    let author1 = first.user.username().to_string();
    let author2 = second.user.username().to_string();
    let reply_id = threads.reply.confirmed_id()?;
    let comment1_id = threads.first.confirmed_id()?;
    let copy_id = threads.first_copy.confirmed_id()?;
    let comment2_id = threads.second.confirmed_id()?;

    ctx.step("Test delete reply as user3 (neither community owner nor comment author)");
    ctx.test(TestCase::delete(Endpoint::Comment(reply_id), StatusCode::FORBIDDEN).token(&third.token))?;

    ctx.step("Test delete reply as user2 (comment author and community owner)");
    ctx.test(TestCase::delete(Endpoint::Comment(reply_id), DELETED_STATUS).token(&second.token))?;

    ctx.step("Test delete comment2 as user1 (neither community owner nor comment author)");
    ctx.test(
        TestCase::delete(Endpoint::Comment(comment2_id), StatusCode::FORBIDDEN).token(&first.token),
    )?;

    ctx.step("Test delete comment2 as user2 (comment author)");
    ctx.test(TestCase::delete(Endpoint::Comment(comment2_id), DELETED_STATUS).token(&second.token))?;

    ctx.step("Test get user2 comments no longer has comment2 and reply");
    let listing = Endpoint::UserResources(author2, UserResource::Comments);
    ctx.expect_not_listed(listing.clone(), &threads.second)?;
    ctx.expect_not_listed(listing, &threads.reply)?;

    ctx.step("Test delete comment1_copy as user2 (community owner)");
    ctx.test(TestCase::delete(Endpoint::Comment(copy_id), DELETED_STATUS).token(&second.token))?;

    ctx.step("Test delete comment1 as user1 (comment author)");
    ctx.test(TestCase::delete(Endpoint::Comment(comment1_id), DELETED_STATUS).token(&first.token))?;

    ctx.step("Test get comment1 after deleting");
    ctx.test(TestCase::get(Endpoint::Comment(comment1_id), StatusCode::NOT_FOUND))?;

    ctx.step("Test get user1 comments no longer has comment1 and comment1_copy");
    let listing = Endpoint::UserResources(author1, UserResource::Comments);
    ctx.expect_not_listed(listing.clone(), &threads.first)?;
    ctx.expect_not_listed(listing, &threads.first_copy)?;

    ctx.step("Test get comments on post1 no longer has any deleted comment");
    for comment in [&threads.first, &threads.first_copy, &threads.second, &threads.reply] {
        ctx.expect_not_listed(Endpoint::PostComments(post_id), comment)?;
    }
    Ok(())
}

fn remove_posts(
    ctx: &mut HarnessContext,
    community: &Community,
    posts: &Posts,
    first: &Account,
    second: &Account,
    third: &Account,
) -> HarnessResult<()> {
    let post1_id = posts.first.confirmed_id()?;
    let copy_id = posts.first_copy.confirmed_id()?;
    let post2_id = posts.second.confirmed_id()?;
    let author1 = first.user.username().to_string();
    let author2 = second.user.username().to_string();

    ctx.step("Test delete post1 as user3 (neither community owner nor post author)");
    ctx.test(TestCase::delete(Endpoint::Post(post1_id), StatusCode::FORBIDDEN).token(&third.token))?;

    ctx.step("Test delete post2 as user1 (neither community owner nor post author)");
    ctx.test(TestCase::delete(Endpoint::Post(post2_id), StatusCode::FORBIDDEN).token(&first.token))?;

    ctx.step("Test delete post2 as user2 (community owner and post author)");
    ctx.test(TestCase::delete(Endpoint::Post(post2_id), DELETED_STATUS).token(&second.token))?;

    ctx.step("Test get post2 after deleting");
    ctx.test(TestCase::get(Endpoint::Post(post2_id), StatusCode::NOT_FOUND))?;

    ctx.step("Test get user2 posts no longer has post2");
    ctx.expect_not_listed(Endpoint::UserResources(author2, UserResource::Posts), &posts.second)?;

    ctx.step("Test delete post1 as user2 (community owner)");
    ctx.test(TestCase::delete(Endpoint::Post(post1_id), DELETED_STATUS).token(&second.token))?;

    ctx.step("Test get post1 after deleting");
    ctx.test(TestCase::get(Endpoint::Post(post1_id), StatusCode::NOT_FOUND))?;

    ctx.step("Test delete post1_copy as user1 (post author)");
    ctx.test(TestCase::delete(Endpoint::Post(copy_id), DELETED_STATUS).token(&first.token))?;

    ctx.step("Test get post1_copy after deleting");
    ctx.test(TestCase::get(Endpoint::Post(copy_id), StatusCode::NOT_FOUND))?;

    ctx.step("Test get user1 posts no longer has post1 and post1_copy");
    let listing = Endpoint::UserResources(author1, UserResource::Posts);
    ctx.expect_not_listed(listing.clone(), &posts.first)?;
    ctx.expect_not_listed(listing, &posts.first_copy)?;

    ctx.step("Test get posts in community1 no longer has any deleted post");
    let listing = Endpoint::CommunityPosts(community.name().to_string());
    for post in [&posts.first, &posts.first_copy, &posts.second] {
        ctx.expect_not_listed(listing.clone(), post)?;
    }
    Ok(())
}

fn remove_community(
    ctx: &mut HarnessContext,
    community: &Community,
    first: &Account,
    second: &Account,
) -> HarnessResult<()> {
    let name = community.name().to_string();
    let owner = second.user.username().to_string();

    ctx.step("Test delete community1 as user1 (previous community owner)");
    ctx.test(
        TestCase::delete(Endpoint::Community(name.clone()), StatusCode::FORBIDDEN)
            .token(&first.token),
    )?;

    ctx.step("Test delete community1 as user2 (community owner)");
    ctx.test(TestCase::delete(Endpoint::Community(name.clone()), DELETED_STATUS).token(&second.token))?;

    ctx.step("Test get community1 after deleting");
    ctx.test(TestCase::get(Endpoint::Community(name), StatusCode::NOT_FOUND))?;

    ctx.step("Test get communities no longer has community1");
    ctx.expect_not_listed(Endpoint::Communities, community)?;

    ctx.step("Test get user2 communities no longer has community1");
    ctx.expect_not_listed(Endpoint::UserResources(owner, UserResource::Communities), community)?;
    Ok(())
}
