// crates/repost-conformance-core/src/models/comment.rs
// ============================================================================
// Module: Comment Model
// Description: Local mirror of a comment or a reply to another comment.
// Purpose: Track thread placement, content, and vote totals.
// Dependencies: serde_json
// ============================================================================

//! Comments form a tree on the server through `parent_comment_id`; the harness
//! only keeps flat handles and never walks the tree itself.

use serde_json::Value;
use serde_json::json;

use crate::entity::Entity;
use crate::entity::EntityError;
use crate::entity::FieldRoles;
use crate::entity::FieldSpec;
use crate::entity::Votable;
use crate::entity::optional_id;
use crate::entity::required_string;
use crate::token::TokenGenerator;

/// Local mirror of a comment.
///
/// # Invariants
/// - `content` is never `None`; editing it to `null` is rejected locally.
/// - `id` is `None` until adopted from a creation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Username of the author.
    pub author_username: String,
    /// Name of the community containing the post.
    pub parent_community_name: String,
    /// Identifier of the post being discussed.
    pub parent_post_id: u64,
    /// Identifier of the comment being replied to, for replies.
    pub parent_comment_id: Option<u64>,
    /// Comment body.
    pub content: String,
    /// Server-assigned identifier.
    pub id: Option<u64>,
    /// Expected aggregate vote total.
    pub votes: i64,
}

impl Comment {
    /// Creates an unconfirmed top-level comment with random content.
    #[must_use]
    pub fn random(
        author_username: impl Into<String>,
        parent_community_name: impl Into<String>,
        parent_post_id: u64,
        tokens: &mut TokenGenerator,
    ) -> Self {
        Self {
            author_username: author_username.into(),
            parent_community_name: parent_community_name.into(),
            parent_post_id,
            parent_comment_id: None,
            content: tokens.hex_token(),
            id: None,
            votes: 0,
        }
    }

    /// Creates an unconfirmed reply to `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::Unconfirmed`] when `parent` has no server id yet.
    pub fn reply_to(
        author_username: impl Into<String>,
        parent: &Self,
        tokens: &mut TokenGenerator,
    ) -> Result<Self, EntityError> {
        let parent_id = parent.confirmed_id()?;
        let mut reply = Self::random(
            author_username,
            parent.parent_community_name.clone(),
            parent.parent_post_id,
            tokens,
        );
        reply.parent_comment_id = Some(parent_id);
        Ok(reply)
    }
}

static COMMENT_FIELDS: &[FieldSpec<Comment>] = &[
    FieldSpec {
        name: "id",
        get: |comment: &Comment| Value::from(comment.id),
        set: Some(|comment: &mut Comment, value: Value| -> Result<(), EntityError> {
            comment.id = optional_id(Comment::KIND, "id", value)?;
            Ok(())
        }),
        roles: FieldRoles::SERVER_ASSIGNED,
    },
    FieldSpec {
        name: "content",
        get: |comment: &Comment| Value::from(comment.content.clone()),
        set: Some(|comment: &mut Comment, value: Value| -> Result<(), EntityError> {
            comment.content = required_string(Comment::KIND, "content", value)?;
            Ok(())
        }),
        roles: FieldRoles::EDITABLE,
    },
    FieldSpec {
        name: "author_username",
        get: |comment: &Comment| Value::from(comment.author_username.clone()),
        set: None,
        roles: FieldRoles::COMPARED,
    },
    FieldSpec {
        name: "parent_community_name",
        get: |comment: &Comment| Value::from(comment.parent_community_name.clone()),
        set: None,
        roles: FieldRoles::COMPARED,
    },
    FieldSpec {
        name: "parent_post_id",
        get: |comment: &Comment| Value::from(comment.parent_post_id),
        set: None,
        roles: FieldRoles::COMPARED,
    },
    FieldSpec {
        name: "parent_comment_id",
        get: |comment: &Comment| Value::from(comment.parent_comment_id),
        set: None,
        roles: FieldRoles::COMPARED,
    },
    FieldSpec {
        name: "votes",
        get: |comment: &Comment| Value::from(comment.votes),
        set: None,
        roles: FieldRoles::COMPARED,
    },
];

impl Entity for Comment {
    const KIND: &'static str = "comment";

    fn fields() -> &'static [FieldSpec<Self>] {
        COMMENT_FIELDS
    }

    fn create_payload(&self) -> Value {
        json!({ "content": self.content })
    }
}

impl Votable for Comment {
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
