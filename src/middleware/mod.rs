//! Middleware and extractors for authentication and authorization.
//!
//! # Modules
//!
//! - [`auth`]: `AuthUser` extractor and per-permission extractors
//! - [`permission`]: route-level permission layer
//!
//! # Authentication Flow
//!
//! 1. Client sends request with `Authorization: Bearer <token>` header
//! 2. The token is verified against the identity provider's signing keys
//! 3. The required permission is checked against the token's `permissions` claim
//! 4. Handler executes if all checks pass; otherwise the error renders as
//!    `{"success": false, "error": <status>, "message": {"code", "description"}}`
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::{AuthUser, RequirePostMovies};
//!
//! // Any valid token
//! async fn me(auth_user: AuthUser) -> impl IntoResponse {
//!     // ...
//! }
//!
//! // Permission-based access control
//! async fn create_movie(RequirePostMovies(auth_user): RequirePostMovies) -> impl IntoResponse {
//!     // Only executes if the token grants "post:movies"
//! }
//! ```

pub mod auth;
pub mod permission;
