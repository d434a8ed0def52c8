// crates/repost-conformance-core/src/lib.rs
// ============================================================================
// Module: Repost Conformance Core Library
// Description: Local mirrors of Repost API entities and their field tables.
// Purpose: Provide table-driven edit/compare semantics shared by all entities.
// Dependencies: rand, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The core crate models the four Repost entity kinds (users, communities,
//! posts, comments) as plain mutable records. Each kind declares a static
//! [`FieldSpec`] table; the shared [`Entity`] algorithms use that table to
//! build edit payloads, compare against server JSON, and adopt
//! server-assigned identifiers.
//! Invariants:
//! - Constructing an entity never performs I/O.
//! - Randomness only comes from an explicit [`TokenGenerator`].
//! - Comparison is strict JSON value equality per field.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod entity;
pub mod models;
pub mod token;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use entity::CompareTarget;
pub use entity::Entity;
pub use entity::EntityError;
pub use entity::FieldRoles;
pub use entity::FieldSpec;
pub use entity::Votable;
pub use models::Comment;
pub use models::Community;
pub use models::Post;
pub use models::User;
pub use token::TokenGenerator;
