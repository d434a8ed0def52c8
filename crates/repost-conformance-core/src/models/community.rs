// crates/repost-conformance-core/src/models/community.rs
// ============================================================================
// Module: Community Model
// Description: Local mirror of a Repost community.
// Purpose: Track ownership and description across transfer scenarios.
// Dependencies: serde_json
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::entity::Entity;
use crate::entity::EntityError;
use crate::entity::FieldRoles;
use crate::entity::FieldSpec;
use crate::entity::required_string;
use crate::token::TokenGenerator;

/// Local mirror of a community.
///
/// Ownership transfer is requested through the `new_owner_username` edit key,
/// which the field table maps onto [`Community::owner_username`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Community {
    /// Username of the current owner.
    pub owner_username: String,
    /// Unique community name.
    name: String,
    /// Community description.
    pub description: String,
}

impl Community {
    /// Creates a community with random name and description.
    #[must_use]
    pub fn random(owner_username: impl Into<String>, tokens: &mut TokenGenerator) -> Self {
        Self {
            owner_username: owner_username.into(),
            name: tokens.hex_token(),
            description: tokens.hex_token(),
        }
    }

    /// Returns the unique community name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn set_owner(community: &mut Community, value: Value) -> Result<(), EntityError> {
    community.owner_username = required_string(Community::KIND, "owner_username", value)?;
    Ok(())
}

static COMMUNITY_FIELDS: &[FieldSpec<Community>] = &[
    FieldSpec {
        name: "name",
        get: |community: &Community| Value::from(community.name.clone()),
        set: None,
        roles: FieldRoles::COMPARED,
    },
    FieldSpec {
        name: "description",
        get: |community: &Community| Value::from(community.description.clone()),
        set: Some(|community: &mut Community, value: Value| -> Result<(), EntityError> {
            community.description = required_string(Community::KIND, "description", value)?;
            Ok(())
        }),
        roles: FieldRoles::EDITABLE,
    },
    FieldSpec {
        name: "owner_username",
        get: |community: &Community| Value::from(community.owner_username.clone()),
        set: None,
        roles: FieldRoles::COMPARED,
    },
    FieldSpec {
        name: "new_owner_username",
        get: |community: &Community| Value::from(community.owner_username.clone()),
        set: Some(set_owner),
        roles: FieldRoles::EDIT_ONLY,
    },
];

impl Entity for Community {
    const KIND: &'static str = "community";

    fn fields() -> &'static [FieldSpec<Self>] {
        COMMUNITY_FIELDS
    }

    fn create_payload(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
        })
    }
}
