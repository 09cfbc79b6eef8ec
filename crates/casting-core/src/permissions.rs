//! Permission constants for the Casting Agency API.
//!
//! These are the permission strings the identity provider grants through role
//! assignments and places in the access token's `permissions` claim. Routes
//! name their requirement with these constants instead of string literals.
//!
//! # Example
//!
//! ```ignore
//! use casting_core::permissions;
//!
//! let claims = pipeline.authorize(header, permissions::GET_MOVIES).await?;
//! ```

// =============================================================================
// Movies permissions
// =============================================================================

/// Permission to list movies
pub const GET_MOVIES: &str = "get:movies";
/// Permission to create movies
pub const POST_MOVIES: &str = "post:movies";
/// Permission to update movies
pub const PATCH_MOVIES: &str = "patch:movies";
/// Permission to delete movies
pub const DELETE_MOVIES: &str = "delete:movies";

// =============================================================================
// Actors permissions
// =============================================================================

/// Permission to list actors and movie casts
pub const GET_ACTORS: &str = "get:actors";
/// Permission to create actors
pub const POST_ACTORS: &str = "post:actors";
/// Permission to update actors
pub const PATCH_ACTORS: &str = "patch:actors";
/// Permission to delete actors
pub const DELETE_ACTORS: &str = "delete:actors";

/// Requirement for routes that need a verified identity but no specific grant.
pub const AUTHENTICATED: &str = "";

/// Every permission the API knows about.
pub const ALL: &[&str] = &[
    GET_MOVIES,
    POST_MOVIES,
    PATCH_MOVIES,
    DELETE_MOVIES,
    GET_ACTORS,
    POST_ACTORS,
    PATCH_ACTORS,
    DELETE_ACTORS,
];
