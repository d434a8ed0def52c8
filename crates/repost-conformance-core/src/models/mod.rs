// crates/repost-conformance-core/src/models/mod.rs
// ============================================================================
// Module: Entity Models
// Description: User, Community, Post, and Comment mirrors.
// Purpose: Group the concrete entity kinds and their field tables.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Concrete entity kinds. Each module owns the static field table consumed by
//! [`crate::Entity`].

mod comment;
mod community;
mod post;
mod user;

pub use comment::Comment;
pub use community::Community;
pub use post::Post;
pub use user::User;
