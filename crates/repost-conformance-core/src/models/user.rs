// crates/repost-conformance-core/src/models/user.rs
// ============================================================================
// Module: User Model
// Description: Local mirror of a Repost user account.
// Purpose: Track credentials and profile fields for account scenarios.
// Dependencies: serde_json
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::entity::Entity;
use crate::entity::EntityError;
use crate::entity::FieldRoles;
use crate::entity::FieldSpec;
use crate::entity::optional_string;
use crate::token::TokenGenerator;

/// Local mirror of a user account.
///
/// # Invariants
/// - `username` is fixed at construction; no setter exists for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Globally unique login name.
    username: String,
    /// Plain-text password used for login.
    password: String,
    /// Optional profile text.
    pub bio: Option<String>,
    /// Optional avatar location.
    pub avatar_url: Option<String>,
}

impl User {
    /// Creates a user with random username and password.
    #[must_use]
    pub fn random(tokens: &mut TokenGenerator) -> Self {
        let username = tokens.hex_token();
        Self::with_username(username, tokens)
    }

    /// Creates a user with a chosen username and a random password.
    #[must_use]
    pub fn with_username(username: impl Into<String>, tokens: &mut TokenGenerator) -> Self {
        Self {
            username: username.into(),
            password: tokens.hex_token(),
            bio: None,
            avatar_url: None,
        }
    }

    /// Returns the login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the login password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

static USER_FIELDS: &[FieldSpec<User>] = &[
    FieldSpec {
        name: "username",
        get: |user: &User| Value::from(user.username.clone()),
        set: None,
        roles: FieldRoles::COMPARED,
    },
    FieldSpec {
        name: "bio",
        get: |user: &User| Value::from(user.bio.clone()),
        set: Some(|user: &mut User, value: Value| -> Result<(), EntityError> {
            user.bio = optional_string(User::KIND, "bio", value)?;
            Ok(())
        }),
        roles: FieldRoles::EDITABLE,
    },
    FieldSpec {
        name: "avatar_url",
        get: |user: &User| Value::from(user.avatar_url.clone()),
        set: Some(|user: &mut User, value: Value| -> Result<(), EntityError> {
            user.avatar_url = optional_string(User::KIND, "avatar_url", value)?;
            Ok(())
        }),
        roles: FieldRoles::EDITABLE,
    },
];

impl Entity for User {
    const KIND: &'static str = "user";

    fn fields() -> &'static [FieldSpec<Self>] {
        USER_FIELDS
    }

    fn create_payload(&self) -> Value {
        json!({
            "username": self.username,
            "password": self.password,
        })
    }
}
