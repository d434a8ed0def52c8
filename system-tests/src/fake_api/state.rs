// system-tests/src/fake_api/state.rs
// ============================================================================
// Module: Fake Repost API State
// Description: In-memory users, tokens, communities, posts, comments, votes.
// Purpose: Apply the Repost ownership and validation rules to requests.
// Dependencies: reqwest, serde_json
// ============================================================================

//! ## Overview
//! Handlers return `Result<Reply, Reply>` so lookups and permission checks
//! short-circuit with `?`. Callers authenticate before invoking a protected
//! handler, which then checks existence, permission, and payload validity in
//! that order.
//! Invariants:
//! - Identifiers are never reused, even after deletion.
//! - A voter has at most one active vote per target unless
//!   [`Quirk::VotesAccumulate`] is set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use reqwest::StatusCode;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use super::Quirk;

// ============================================================================
// SECTION: Replies
// ============================================================================

/// Status and JSON body produced by a handler; `Null` means no body.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Response status.
    pub status: StatusCode,
    /// Response body.
    pub body: Value,
}

impl Reply {
    /// 200 with `body`.
    pub const fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// 201 with `body`.
    pub const fn created(body: Value) -> Self {
        Self {
            status: StatusCode::CREATED,
            body,
        }
    }

    /// Error status with a `detail` body.
    pub fn error(status: StatusCode, detail: &str) -> Self {
        Self {
            status,
            body: json!({ "detail": detail }),
        }
    }
}

/// Handler outcome; the error side is still a well-formed response.
pub type Handled = Result<Reply, Reply>;

/// 404 naming the missing kind.
fn not_found(kind: &str) -> Reply {
    Reply::error(StatusCode::NOT_FOUND, &format!("{kind} not found"))
}

/// 403 for callers without rights.
fn forbidden() -> Reply {
    Reply::error(StatusCode::FORBIDDEN, "Not allowed")
}

/// 422 with `detail`.
fn unprocessable(detail: &str) -> Reply {
    Reply::error(StatusCode::UNPROCESSABLE_ENTITY, detail)
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Stored account.
#[derive(Debug, Clone)]
struct UserRecord {
    /// Login password.
    password: String,
    /// Profile text.
    bio: Option<String>,
    /// Avatar location.
    avatar_url: Option<String>,
}

/// Stored community.
#[derive(Debug, Clone)]
struct CommunityRecord {
    /// Community description.
    description: String,
    /// Owning username.
    owner: String,
}

/// Stored post.
#[derive(Debug, Clone)]
struct PostRecord {
    /// Author username.
    author: String,
    /// Parent community name.
    community: String,
    /// Post title.
    title: String,
    /// Optional link.
    url: Option<String>,
    /// Optional body.
    content: Option<String>,
    /// Latest vote per voter.
    votes: BTreeMap<String, i64>,
}

/// Stored comment.
#[derive(Debug, Clone)]
struct CommentRecord {
    /// Author username.
    author: String,
    /// Community of the parent post.
    community: String,
    /// Parent post id.
    post_id: u64,
    /// Parent comment id for replies.
    parent_comment_id: Option<u64>,
    /// Comment body.
    content: String,
    /// Latest vote per voter.
    votes: BTreeMap<String, i64>,
}

/// Wire form of a user.
fn user_json(username: &str, user: &UserRecord) -> Value {
    json!({
        "username": username,
        "bio": user.bio,
        "avatar_url": user.avatar_url,
    })
}

/// Wire form of a community.
fn community_json(name: &str, community: &CommunityRecord) -> Value {
    json!({
        "name": name,
        "description": community.description,
        "owner_username": community.owner,
    })
}

/// Wire form of a post.
fn post_json(id: u64, post: &PostRecord) -> Value {
    json!({
        "id": id,
        "title": post.title,
        "url": post.url,
        "content": post.content,
        "author_username": post.author,
        "parent_community_name": post.community,
        "votes": post.votes.values().sum::<i64>(),
    })
}

/// Wire form of a comment.
fn comment_json(id: u64, comment: &CommentRecord) -> Value {
    json!({
        "id": id,
        "content": comment.content,
        "author_username": comment.author,
        "parent_community_name": comment.community,
        "parent_post_id": comment.post_id,
        "parent_comment_id": comment.parent_comment_id,
        "votes": comment.votes.values().sum::<i64>(),
    })
}

// ============================================================================
// SECTION: Payload Helpers
// ============================================================================

/// Reads a mandatory string key.
fn required_string(body: &Map<String, Value>, key: &str) -> Result<String, Reply> {
    match body.get(key) {
        Some(Value::String(text)) => Ok(text.clone()),
        _ => Err(unprocessable(&format!("{key} must be a string"))),
    }
}

/// `None` when absent, `Some(None)` for an explicit null.
fn nullable_string(body: &Map<String, Value>, key: &str) -> Result<Option<Option<String>>, Reply> {
    match body.get(key) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(text)) => Ok(Some(Some(text.clone()))),
        Some(_) => Err(unprocessable(&format!("{key} must be a string or null"))),
    }
}

/// Like [`required_string`] but absent keys are allowed.
fn replacement_string(body: &Map<String, Value>, key: &str) -> Result<Option<String>, Reply> {
    if body.contains_key(key) { required_string(body, key).map(Some) } else { Ok(None) }
}

/// Parses a vote path segment.
fn parse_vote(raw: &str) -> Result<i64, Reply> {
    raw.parse::<i64>()
        .ok()
        .filter(|value| (-1 ..= 1).contains(value))
        .ok_or_else(|| unprocessable("vote must be -1, 0, or 1"))
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Whole server state.
#[derive(Debug, Default)]
pub struct ApiState {
    /// Enabled deviations.
    quirks: BTreeSet<Quirk>,
    /// Accounts by username.
    users: BTreeMap<String, UserRecord>,
    /// Token value to username.
    tokens: BTreeMap<String, String>,
    /// Communities by name.
    communities: BTreeMap<String, CommunityRecord>,
    /// Posts by id.
    posts: BTreeMap<u64, PostRecord>,
    /// Comments by id.
    comments: BTreeMap<u64, CommentRecord>,
    /// Last identifier handed out; shared by posts and comments.
    last_id: u64,
    /// Tokens issued so far.
    issued_tokens: u64,
}

impl ApiState {
    /// Creates an empty server with the given deviations.
    pub fn new(quirks: BTreeSet<Quirk>) -> Self {
        Self {
            quirks,
            ..Self::default()
        }
    }

    /// Returns true when `quirk` is enabled.
    fn has(&self, quirk: Quirk) -> bool {
        self.quirks.contains(&quirk)
    }

    /// Hands out the next identifier.
    const fn allocate_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    /// Authors and community owners may delete content.
    fn may_moderate(&self, actor: &str, author: &str, community: &str) -> bool {
        actor == author || self.communities.get(community).is_some_and(|c| c.owner == actor)
    }

    /// 404 unless `username` exists.
    fn require_user(&self, username: &str) -> Result<(), Reply> {
        if self.users.contains_key(username) { Ok(()) } else { Err(not_found("User")) }
    }

    // ------------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------------

    /// Resolves the bearer credential of a request to a username.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<String, Reply> {
        let Some(header) = authorization else {
            return Err(Reply::error(StatusCode::UNAUTHORIZED, "Not authenticated"));
        };
        let token = header.strip_prefix("Bearer ").unwrap_or(header);
        match self.tokens.get(token) {
            Some(username) => Ok(username.clone()),
            None if self.has(Quirk::MalformedTokenBadRequest) => {
                Err(Reply::error(StatusCode::BAD_REQUEST, "Malformed token"))
            }
            None => Err(Reply::error(StatusCode::UNAUTHORIZED, "Could not validate credentials")),
        }
    }

    /// Password grant login.
    pub fn login(&mut self, form: &[(String, String)]) -> Handled {
        let field = |key: &str| form.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str());
        if field("grant_type").is_some_and(|grant| grant != "password") {
            return Err(unprocessable("unsupported grant_type"));
        }
        let (Some(username), Some(password)) = (field("username"), field("password")) else {
            return Err(unprocessable("username and password are required"));
        };
        let valid = self.users.get(username).is_some_and(|user| user.password == password);
        if !valid {
            return Err(Reply::error(StatusCode::UNAUTHORIZED, "Incorrect username or password"));
        }
        self.issued_tokens += 1;
        let token = format!("fake-token-{}", self.issued_tokens);
        self.tokens.insert(token.clone(), username.to_string());
        Ok(Reply::ok(json!({ "access_token": token, "token_type": "bearer" })))
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    /// Registers a user.
    pub fn create_user(&mut self, body: &Map<String, Value>) -> Handled {
        let username = required_string(body, "username")?;
        let password = required_string(body, "password")?;
        if self.users.contains_key(&username) {
            return Err(Reply::error(StatusCode::BAD_REQUEST, "Username already taken"));
        }
        let user = UserRecord {
            password,
            bio: None,
            avatar_url: None,
        };
        let reply = Reply::created(user_json(&username, &user));
        self.users.insert(username, user);
        Ok(reply)
    }

    /// Reads a user profile.
    pub fn get_user(&self, username: &str) -> Handled {
        self.users
            .get(username)
            .map(|user| Reply::ok(user_json(username, user)))
            .ok_or_else(|| not_found("User"))
    }

    /// Updates the caller's profile.
    pub fn edit_user(&mut self, username: &str, body: &Map<String, Value>) -> Handled {
        let bio = nullable_string(body, "bio")?;
        let avatar_url = nullable_string(body, "avatar_url")?;
        let user = self.users.get_mut(username).ok_or_else(|| not_found("User"))?;
        if let Some(bio) = bio {
            user.bio = bio;
        }
        if let Some(avatar_url) = avatar_url {
            user.avatar_url = avatar_url;
        }
        Ok(Reply::ok(user_json(username, user)))
    }

    /// Deletes the caller and revokes their tokens.
    pub fn delete_user(&mut self, username: &str) -> Handled {
        let user = self.users.remove(username).ok_or_else(|| not_found("User"))?;
        if !self.has(Quirk::TokensSurviveDeletion) {
            self.tokens.retain(|_, owner| owner != username);
        }
        Ok(Reply::ok(user_json(username, &user)))
    }

    /// Communities owned by a user.
    pub fn user_communities(&self, username: &str) -> Handled {
        self.require_user(username)?;
        Ok(Reply::ok(
            self.communities
                .iter()
                .filter(|(_, community)| community.owner == username)
                .map(|(name, community)| community_json(name, community))
                .collect(),
        ))
    }

    /// Posts written by a user.
    pub fn user_posts(&self, username: &str) -> Handled {
        self.require_user(username)?;
        Ok(Reply::ok(
            self.posts
                .iter()
                .filter(|(_, post)| post.author == username)
                .map(|(id, post)| post_json(*id, post))
                .collect(),
        ))
    }

    /// Comments written by a user.
    pub fn user_comments(&self, username: &str) -> Handled {
        self.require_user(username)?;
        Ok(Reply::ok(
            self.comments
                .iter()
                .filter(|(_, comment)| comment.author == username)
                .map(|(id, comment)| comment_json(*id, comment))
                .collect(),
        ))
    }

    // ------------------------------------------------------------------------
    // Communities
    // ------------------------------------------------------------------------

    /// Every community.
    pub fn list_communities(&self) -> Reply {
        Reply::ok(self.communities.iter().map(|(name, c)| community_json(name, c)).collect())
    }

    /// Founds a community owned by `owner`.
    pub fn create_community(&mut self, owner: &str, body: &Map<String, Value>) -> Handled {
        let name = required_string(body, "name")?;
        let description = required_string(body, "description")?;
        if self.communities.contains_key(&name) {
            return Err(Reply::error(StatusCode::BAD_REQUEST, "Community name already taken"));
        }
        let community = CommunityRecord {
            description,
            owner: owner.to_string(),
        };
        let reply = Reply::created(community_json(&name, &community));
        self.communities.insert(name, community);
        Ok(reply)
    }

    /// Reads a community.
    pub fn get_community(&self, name: &str) -> Handled {
        self.communities
            .get(name)
            .map(|community| Reply::ok(community_json(name, community)))
            .ok_or_else(|| not_found("Community"))
    }

    /// Edits the description or transfers ownership.
    pub fn edit_community(&mut self, actor: &str, name: &str, body: &Map<String, Value>) -> Handled {
        let community = self.communities.get(name).ok_or_else(|| not_found("Community"))?;
        if community.owner != actor {
            return Err(forbidden());
        }
        let description = replacement_string(body, "description")?;
        let new_owner = replacement_string(body, "new_owner_username")?;
        if let Some(owner) = &new_owner {
            self.require_user(owner)?;
        }
        let community = self.communities.get_mut(name).ok_or_else(|| not_found("Community"))?;
        if let Some(description) = description {
            community.description = description;
        }
        if let Some(owner) = new_owner {
            community.owner = owner;
        }
        Ok(Reply::ok(community_json(name, community)))
    }

    /// Deletes a community with its posts and comments.
    pub fn delete_community(&mut self, actor: &str, name: &str) -> Handled {
        let community = self.communities.get(name).ok_or_else(|| not_found("Community"))?;
        if community.owner != actor {
            return Err(forbidden());
        }
        let community = self.communities.remove(name).ok_or_else(|| not_found("Community"))?;
        self.posts.retain(|_, post| post.community != name);
        self.comments.retain(|_, comment| comment.community != name);
        Ok(Reply::ok(community_json(name, &community)))
    }

    // ------------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------------

    /// Posts in a community.
    pub fn community_posts(&self, name: &str) -> Handled {
        if !self.communities.contains_key(name) {
            return Err(not_found("Community"));
        }
        Ok(Reply::ok(
            self.posts
                .iter()
                .filter(|(_, post)| post.community == name)
                .map(|(id, post)| post_json(*id, post))
                .collect(),
        ))
    }

    /// Publishes a post.
    pub fn create_post(&mut self, author: &str, community: &str, body: &Map<String, Value>) -> Handled {
        if !self.communities.contains_key(community) {
            return Err(not_found("Community"));
        }
        let post = PostRecord {
            author: author.to_string(),
            community: community.to_string(),
            title: required_string(body, "title")?,
            url: nullable_string(body, "url")?.flatten(),
            content: nullable_string(body, "content")?.flatten(),
            votes: BTreeMap::new(),
        };
        if self.has(Quirk::DuplicatesShareId)
            && let Some((id, existing)) = self.posts.iter().find(|(_, existing)| {
                existing.author == post.author
                    && existing.community == post.community
                    && existing.title == post.title
                    && existing.url == post.url
                    && existing.content == post.content
            })
        {
            return Ok(Reply::created(post_json(*id, existing)));
        }
        let id = self.allocate_id();
        let reply = Reply::created(post_json(id, &post));
        self.posts.insert(id, post);
        Ok(reply)
    }

    /// Reads a post.
    pub fn get_post(&self, id: u64) -> Handled {
        self.posts.get(&id).map(|post| Reply::ok(post_json(id, post))).ok_or_else(|| not_found("Post"))
    }

    /// Edits a post; only its author may.
    pub fn edit_post(&mut self, actor: &str, id: u64, body: &Map<String, Value>) -> Handled {
        let post = self.posts.get_mut(&id).ok_or_else(|| not_found("Post"))?;
        if post.author != actor {
            return Err(forbidden());
        }
        let title = replacement_string(body, "title")?;
        let url = nullable_string(body, "url")?;
        let content = nullable_string(body, "content")?;
        if let Some(title) = title {
            post.title = title;
        }
        if let Some(url) = url {
            post.url = url;
        }
        if let Some(content) = content {
            post.content = content;
        }
        Ok(Reply::ok(post_json(id, post)))
    }

    /// Deletes a post and its comments; author or community owner.
    pub fn delete_post(&mut self, actor: &str, id: u64) -> Handled {
        let post = self.posts.get(&id).ok_or_else(|| not_found("Post"))?;
        if !self.may_moderate(actor, &post.author, &post.community) {
            return Err(forbidden());
        }
        let post = self.posts.remove(&id).ok_or_else(|| not_found("Post"))?;
        self.comments.retain(|_, comment| comment.post_id != id);
        Ok(Reply::ok(post_json(id, &post)))
    }

    /// Records a vote on a post.
    pub fn vote_post(&mut self, voter: &str, id: u64, raw: &str) -> Handled {
        let accumulate = self.has(Quirk::VotesAccumulate);
        let post = self.posts.get_mut(&id).ok_or_else(|| not_found("Post"))?;
        let value = parse_vote(raw)?;
        record_vote(&mut post.votes, voter, value, accumulate);
        Ok(Reply::ok(post_json(id, post)))
    }

    // ------------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------------

    /// Comments on a post, replies included.
    pub fn post_comments(&self, post_id: u64) -> Handled {
        if !self.posts.contains_key(&post_id) {
            return Err(not_found("Post"));
        }
        Ok(Reply::ok(
            self.comments
                .iter()
                .filter(|(_, comment)| comment.post_id == post_id)
                .map(|(id, comment)| comment_json(*id, comment))
                .collect(),
        ))
    }

    /// Comments on a post.
    pub fn comment_on_post(&mut self, author: &str, post_id: u64, body: &Map<String, Value>) -> Handled {
        let community = self
            .posts
            .get(&post_id)
            .map(|post| post.community.clone())
            .ok_or_else(|| not_found("Post"))?;
        self.insert_comment(author, community, post_id, None, body)
    }

    /// Replies to a comment.
    pub fn reply_to_comment(&mut self, author: &str, parent_id: u64, body: &Map<String, Value>) -> Handled {
        let (community, post_id) = self
            .comments
            .get(&parent_id)
            .map(|parent| (parent.community.clone(), parent.post_id))
            .ok_or_else(|| not_found("Comment"))?;
        self.insert_comment(author, community, post_id, Some(parent_id), body)
    }

    /// Stores a validated comment or reply.
    fn insert_comment(
        &mut self,
        author: &str,
        community: String,
        post_id: u64,
        parent_comment_id: Option<u64>,
        body: &Map<String, Value>,
    ) -> Handled {
        let comment = CommentRecord {
            author: author.to_string(),
            community,
            post_id,
            parent_comment_id,
            content: required_string(body, "content")?,
            votes: BTreeMap::new(),
        };
        if self.has(Quirk::DuplicatesShareId)
            && let Some((id, existing)) = self.comments.iter().find(|(_, existing)| {
                existing.author == comment.author
                    && existing.post_id == comment.post_id
                    && existing.parent_comment_id == comment.parent_comment_id
                    && existing.content == comment.content
            })
        {
            return Ok(Reply::created(comment_json(*id, existing)));
        }
        let id = self.allocate_id();
        let reply = Reply::created(comment_json(id, &comment));
        self.comments.insert(id, comment);
        Ok(reply)
    }

    /// Reads a comment.
    pub fn get_comment(&self, id: u64) -> Handled {
        self.comments
            .get(&id)
            .map(|comment| Reply::ok(comment_json(id, comment)))
            .ok_or_else(|| not_found("Comment"))
    }

    /// Edits a comment; only its author may.
    pub fn edit_comment(&mut self, actor: &str, id: u64, body: &Map<String, Value>) -> Handled {
        let comment = self.comments.get_mut(&id).ok_or_else(|| not_found("Comment"))?;
        if comment.author != actor {
            return Err(forbidden());
        }
        if let Some(content) = replacement_string(body, "content")? {
            comment.content = content;
        }
        Ok(Reply::ok(comment_json(id, comment)))
    }

    /// Deletes a comment and its reply tree; author or community owner.
    pub fn delete_comment(&mut self, actor: &str, id: u64) -> Handled {
        let comment = self.comments.get(&id).ok_or_else(|| not_found("Comment"))?;
        if !self.may_moderate(actor, &comment.author, &comment.community) {
            return Err(forbidden());
        }
        let mut doomed = BTreeSet::from([id]);
        loop {
            let before = doomed.len();
            let children: Vec<u64> = self
                .comments
                .iter()
                .filter(|(_, child)| child.parent_comment_id.is_some_and(|parent| doomed.contains(&parent)))
                .map(|(child_id, _)| *child_id)
                .collect();
            doomed.extend(children);
            if doomed.len() == before {
                break;
            }
        }
        let comment = self.comments.remove(&id).ok_or_else(|| not_found("Comment"))?;
        self.comments.retain(|child_id, _| !doomed.contains(child_id));
        Ok(Reply::ok(comment_json(id, &comment)))
    }

    /// Records a vote on a comment.
    pub fn vote_comment(&mut self, voter: &str, id: u64, raw: &str) -> Handled {
        let accumulate = self.has(Quirk::VotesAccumulate);
        let comment = self.comments.get_mut(&id).ok_or_else(|| not_found("Comment"))?;
        let value = parse_vote(raw)?;
        record_vote(&mut comment.votes, voter, value, accumulate);
        Ok(Reply::ok(comment_json(id, comment)))
    }
}

/// Stores or adds a vote value.
fn record_vote(votes: &mut BTreeMap<String, i64>, voter: &str, value: i64, accumulate: bool) {
    if accumulate {
        *votes.entry(voter.to_string()).or_insert(0) += value;
    } else {
        votes.insert(voter.to_string(), value);
    }
}
