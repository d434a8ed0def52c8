// crates/repost-conformance-core/src/models/post.rs
// ============================================================================
// Module: Post Model
// Description: Local mirror of a post inside a community.
// Purpose: Track server-assigned ids, editable content, and vote totals.
// Dependencies: serde_json
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::entity::Entity;
use crate::entity::EntityError;
use crate::entity::FieldRoles;
use crate::entity::FieldSpec;
use crate::entity::Votable;
use crate::entity::optional_id;
use crate::entity::optional_string;
use crate::entity::required_string;
use crate::token::TokenGenerator;

/// Local mirror of a post.
///
/// # Invariants
/// - `title` is never `None`; editing it to `null` is rejected locally.
/// - `id` is `None` until adopted from a creation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Username of the author.
    pub author_username: String,
    /// Name of the community the post lives in.
    pub parent_community_name: String,
    /// Post title.
    pub title: String,
    /// Optional link.
    pub url: Option<String>,
    /// Optional body text.
    pub content: Option<String>,
    /// Server-assigned identifier.
    pub id: Option<u64>,
    /// Expected aggregate vote total.
    pub votes: i64,
}

impl Post {
    /// Creates an unconfirmed post with a random title.
    #[must_use]
    pub fn random(
        author_username: impl Into<String>,
        parent_community_name: impl Into<String>,
        tokens: &mut TokenGenerator,
    ) -> Self {
        Self {
            author_username: author_username.into(),
            parent_community_name: parent_community_name.into(),
            title: tokens.hex_token(),
            url: None,
            content: None,
            id: None,
            votes: 0,
        }
    }
}

static POST_FIELDS: &[FieldSpec<Post>] = &[
    FieldSpec {
        name: "id",
        get: |post: &Post| Value::from(post.id),
        set: Some(|post: &mut Post, value: Value| -> Result<(), EntityError> {
            post.id = optional_id(Post::KIND, "id", value)?;
            Ok(())
        }),
        roles: FieldRoles::SERVER_ASSIGNED,
    },
    FieldSpec {
        name: "title",
        get: |post: &Post| Value::from(post.title.clone()),
        set: Some(|post: &mut Post, value: Value| -> Result<(), EntityError> {
            post.title = required_string(Post::KIND, "title", value)?;
            Ok(())
        }),
        roles: FieldRoles::EDITABLE,
    },
    FieldSpec {
        name: "url",
        get: |post: &Post| Value::from(post.url.clone()),
        set: Some(|post: &mut Post, value: Value| -> Result<(), EntityError> {
            post.url = optional_string(Post::KIND, "url", value)?;
            Ok(())
        }),
        roles: FieldRoles::EDITABLE,
    },
    FieldSpec {
        name: "content",
        get: |post: &Post| Value::from(post.content.clone()),
        set: Some(|post: &mut Post, value: Value| -> Result<(), EntityError> {
            post.content = optional_string(Post::KIND, "content", value)?;
            Ok(())
        }),
        roles: FieldRoles::EDITABLE,
    },
    FieldSpec {
        name: "author_username",
        get: |post: &Post| Value::from(post.author_username.clone()),
        set: None,
        roles: FieldRoles::COMPARED,
    },
    FieldSpec {
        name: "parent_community_name",
        get: |post: &Post| Value::from(post.parent_community_name.clone()),
        set: None,
        roles: FieldRoles::COMPARED,
    },
    FieldSpec {
        name: "votes",
        get: |post: &Post| Value::from(post.votes),
        set: None,
        roles: FieldRoles::COMPARED,
    },
];

impl Entity for Post {
    const KIND: &'static str = "post";

    fn fields() -> &'static [FieldSpec<Self>] {
        POST_FIELDS
    }

    fn create_payload(&self) -> Value {
        json!({
            "title": self.title,
            "url": self.url,
            "content": self.content,
        })
    }
}

impl Votable for Post {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn votes(&self) -> i64 {
        self.votes
    }

    fn set_votes(&mut self, votes: i64) {
        self.votes = votes;
    }
}
