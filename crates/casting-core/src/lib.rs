//! # Casting Core
//!
//! Core types shared by every crate of the Casting Agency API.
//!
//! - [`errors`]: the authorization error taxonomy ([`AuthError`]), its JSON rendering,
//!   and [`ApiError`] for the remaining HTTP failures
//! - [`permissions`]: permission strings granted by the identity provider
//!
//! # Example
//!
//! ```ignore
//! use casting_core::{AuthError, permissions};
//!
//! let err = AuthError::PermissionDenied;
//! assert_eq!(err.status().as_u16(), 403);
//! assert_eq!(err.code(), "unauthorized");
//!
//! let required = permissions::GET_MOVIES;
//! ```

pub mod errors;
pub mod permissions;

// Re-export commonly used types at crate root
pub use errors::{ApiError, AuthError, ErrorBody, ErrorMessage, render};
