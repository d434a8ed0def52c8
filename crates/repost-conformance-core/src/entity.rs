// crates/repost-conformance-core/src/entity.rs
// ============================================================================
// Module: Entity Field Tables
// Description: Table-driven edit, compare, and adopt algorithms.
// Purpose: Share one mutation/diff implementation across all entity kinds.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every entity kind enumerates its wire fields once, as a static slice of
//! [`FieldSpec`] entries pairing a JSON key with a typed getter and an
//! optional typed setter. [`Entity`] provides the shared algorithms on top of
//! that table:
//!
//! - [`Entity::edit`] and [`Entity::edit_payload`] filter candidate changes
//!   down to the editable keys; only `edit` mutates the local mirror.
//! - [`Entity::matches`] checks every compared field whose key is present in
//!   a server payload, so partial responses are accepted.
//! - [`Entity::compare`] optionally adopts server-assigned fields first.
//!
//! Invariants:
//! - A failed `edit` leaves the local mirror untouched.
//! - Fields absent from a server payload are never checked.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while mutating or adopting entity fields.
///
/// # Invariants
/// - Variants are stable for diagnostics in the runner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// A required field was set to `null`.
    #[error("{kind}.{field} is required and cannot be null")]
    NullRequired {
        /// Entity kind label.
        kind: &'static str,
        /// Field name.
        field: &'static str,
    },
    /// A field value had the wrong JSON type.
    #[error("{kind}.{field} expected {expected}, got {actual}")]
    TypeMismatch {
        /// Entity kind label.
        kind: &'static str,
        /// Field name.
        field: &'static str,
        /// Expected JSON type description.
        expected: &'static str,
        /// Offending value.
        actual: Value,
    },
    /// Edit changes were not a JSON object.
    #[error("{kind} changes must be a JSON object, got {actual}")]
    NotAnObject {
        /// Entity kind label.
        kind: &'static str,
        /// Offending value.
        actual: Value,
    },
    /// A server-assigned field has not been adopted yet.
    #[error("{kind}.{field} has not been assigned by the server yet")]
    Unconfirmed {
        /// Entity kind label.
        kind: &'static str,
        /// Field name.
        field: &'static str,
    },
}

// ============================================================================
// SECTION: Field Tables
// ============================================================================

/// Roles a field plays in the shared algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRoles {
    /// Checked by [`Entity::matches`].
    pub compared: bool,
    /// Accepted by [`Entity::edit`].
    pub editable: bool,
    /// Copied from server payloads by [`Entity::adopt`].
    pub adoptable: bool,
}

impl FieldRoles {
    /// Compared only.
    pub const COMPARED: Self = Self {
        compared: true,
        editable: false,
        adoptable: false,
    };
    /// Compared and editable.
    pub const EDITABLE: Self = Self {
        compared: true,
        editable: true,
        adoptable: false,
    };
    /// Editable request key that never appears in responses.
    pub const EDIT_ONLY: Self = Self {
        compared: false,
        editable: true,
        adoptable: false,
    };
    /// Server-assigned and compared.
    pub const SERVER_ASSIGNED: Self = Self {
        compared: true,
        editable: false,
        adoptable: true,
    };
}

/// Setter signature used by field tables.
pub type FieldSetter<E> = fn(&mut E, Value) -> Result<(), EntityError>;

/// One wire field of an entity kind.
pub struct FieldSpec<E: 'static> {
    /// JSON key used in requests and responses.
    pub name: &'static str,
    /// Reads the local value as JSON.
    pub get: fn(&E) -> Value,
    /// Writes a JSON value into the local mirror, when the field is mutable.
    pub set: Option<FieldSetter<E>>,
    /// Roles the field plays.
    pub roles: FieldRoles,
}

impl<E: 'static> fmt::Debug for FieldSpec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec").field("name", &self.name).field("roles", &self.roles).finish()
    }
}

// ============================================================================
// SECTION: Entity Trait
// ============================================================================

/// Locally tracked mirror of a server-side entity.
pub trait Entity: Clone + fmt::Debug + 'static {
    /// Kind label used in diagnostics.
    const KIND: &'static str;

    /// Field table for this entity kind.
    fn fields() -> &'static [FieldSpec<Self>];

    /// Projects the fields accepted by the creation endpoint.
    fn create_payload(&self) -> Value;

    /// Returns the editable subset of `changes` and applies it locally.
    ///
    /// Unknown or non-editable keys are dropped from the returned payload.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] when `changes` is not an object or a value
    /// cannot be stored; the mirror is left untouched in that case.
    fn edit(&mut self, changes: Value) -> Result<Value, EntityError> {
        let payload = editable_subset::<Self>(changes)?;
        let mut next = self.clone();
        for (key, value) in &payload {
            if let Some(set) = field_named::<Self>(key).and_then(|field| field.set) {
                set(&mut next, value.clone())?;
            }
        }
        *self = next;
        Ok(Value::Object(payload))
    }

    /// Returns the editable subset of `changes` without touching the mirror.
    ///
    /// Used for negative tests where the server is expected to reject the
    /// edit, so the tracked state must stay as it was.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::NotAnObject`] when `changes` is not an object.
    fn edit_payload(&self, changes: Value) -> Result<Value, EntityError> {
        editable_subset::<Self>(changes).map(Value::Object)
    }

    /// Returns true when every compared field present in `server` is equal.
    fn matches(&self, server: &Value) -> bool {
        let Some(object) = server.as_object() else {
            return false;
        };
        Self::fields()
            .iter()
            .filter(|field| field.roles.compared)
            .filter_map(|field| object.get(field.name).map(|remote| (field, remote)))
            .all(|(field, remote)| (field.get)(self) == *remote)
    }

    /// Copies server-assigned fields present in `server` into the mirror.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] when an adopted value has the wrong type.
    fn adopt(&mut self, server: &Value) -> Result<(), EntityError> {
        let Some(object) = server.as_object() else {
            return Ok(());
        };
        for field in Self::fields().iter().filter(|field| field.roles.adoptable) {
            if let (Some(set), Some(remote)) = (field.set, object.get(field.name)) {
                set(self, remote.clone())?;
            }
        }
        Ok(())
    }

    /// Compares against `server`, adopting server-assigned fields first when
    /// `update` is set.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] when adoption fails.
    fn compare(&mut self, server: &Value, update: bool) -> Result<bool, EntityError> {
        if update {
            self.adopt(server)?;
        }
        Ok(self.matches(server))
    }

    /// Renders every compared field as a JSON object.
    fn snapshot(&self) -> Value {
        let object: Map<String, Value> = Self::fields()
            .iter()
            .filter(|field| field.roles.compared)
            .map(|field| (field.name.to_string(), (field.get)(self)))
            .collect();
        Value::Object(object)
    }
}

/// Entities carrying an aggregate vote total.
pub trait Votable: Entity {
    /// Server-assigned identifier, once adopted.
    fn id(&self) -> Option<u64>;

    /// Locally expected vote total.
    fn votes(&self) -> i64;

    /// Updates the locally expected vote total.
    fn set_votes(&mut self, votes: i64);

    /// Returns the adopted identifier or an error when still unconfirmed.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::Unconfirmed`] before the server id is adopted.
    fn confirmed_id(&self) -> Result<u64, EntityError> {
        self.id().ok_or(EntityError::Unconfirmed {
            kind: Self::KIND,
            field: "id",
        })
    }
}

/// Object-safe view of an entity used as a comparison target.
pub trait CompareTarget {
    /// Kind label used in diagnostics.
    fn kind(&self) -> &'static str;

    /// Compares against a server payload; see [`Entity::compare`].
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] when adoption fails.
    fn compare_server(&mut self, server: &Value, update: bool) -> Result<bool, EntityError>;

    /// Renders the expected state for diagnostics.
    fn describe(&self) -> Value;
}

impl<E: Entity> CompareTarget for E {
    fn kind(&self) -> &'static str {
        E::KIND
    }

    fn compare_server(&mut self, server: &Value, update: bool) -> Result<bool, EntityError> {
        self.compare(server, update)
    }

    fn describe(&self) -> Value {
        self.snapshot()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn field_named<E: Entity>(name: &str) -> Option<&'static FieldSpec<E>> {
    E::fields().iter().find(|field| field.name == name)
}

fn editable_subset<E: Entity>(changes: Value) -> Result<Map<String, Value>, EntityError> {
    let Value::Object(changes) = changes else {
        return Err(EntityError::NotAnObject {
            kind: E::KIND,
            actual: changes,
        });
    };
    Ok(changes
        .into_iter()
        .filter(|(key, _)| field_named::<E>(key).is_some_and(|field| field.roles.editable))
        .collect())
}

/// Decodes a required string field.
///
/// # Errors
///
/// Returns [`EntityError`] for `null` or non-string values.
pub fn required_string(
    kind: &'static str,
    field: &'static str,
    value: Value,
) -> Result<String, EntityError> {
    match value {
        Value::String(text) => Ok(text),
        Value::Null => Err(EntityError::NullRequired {
            kind,
            field,
        }),
        other => Err(EntityError::TypeMismatch {
            kind,
            field,
            expected: "string",
            actual: other,
        }),
    }
}

/// Decodes a nullable string field.
///
/// # Errors
///
/// Returns [`EntityError::TypeMismatch`] for non-string, non-null values.
pub fn optional_string(
    kind: &'static str,
    field: &'static str,
    value: Value,
) -> Result<Option<String>, EntityError> {
    match value {
        Value::Null => Ok(None),
        other => required_string(kind, field, other).map(Some),
    }
}

/// Decodes a nullable unsigned identifier.
///
/// # Errors
///
/// Returns [`EntityError::TypeMismatch`] for values that are not `null` or a
/// non-negative integer.
pub fn optional_id(
    kind: &'static str,
    field: &'static str,
    value: Value,
) -> Result<Option<u64>, EntityError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(ref number) if number.is_u64() => Ok(number.as_u64()),
        other => Err(EntityError::TypeMismatch {
            kind,
            field,
            expected: "unsigned integer",
            actual: other,
        }),
    }
}
