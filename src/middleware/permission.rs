//! Route-level permission enforcement.
//!
//! Wraps a route (or a whole router) with a required permission:
//!
//! ```rust,ignore
//! use axum::{Router, middleware, routing::get};
//! use casting_core::permissions;
//! use crate::middleware::permission::{PermissionGuard, enforce_permission};
//!
//! let movies = Router::new()
//!     .route("/movies", get(list_movies))
//!     .route_layer(middleware::from_fn_with_state(
//!         PermissionGuard::new(&state, permissions::GET_MOVIES),
//!         enforce_permission,
//!     ));
//! ```
//!
//! On success the caller's [`AuthUser`] is stored in the request extensions,
//! where the `AuthUser` extractor picks it up without verifying again.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use casting_auth::AuthPipeline;
use casting_core::AuthError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// A required permission bound to the pipeline that checks it.
#[derive(Clone, Debug)]
pub struct PermissionGuard {
    pub auth: AuthPipeline,
    pub permission: &'static str,
}

impl PermissionGuard {
    pub fn new(state: &AppState, permission: &'static str) -> Self {
        Self {
            auth: state.auth.clone(),
            permission,
        }
    }
}

/// Middleware running the authorization pipeline before the wrapped handler.
pub async fn enforce_permission(
    State(guard): State<PermissionGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // No borrow of `req` may be held across the await.
    let raw_header = req.headers().get(header::AUTHORIZATION).cloned();
    let claims = guard
        .auth
        .authorize(raw_header.as_ref().map(|v| v.as_bytes()), guard.permission)
        .await?;

    req.extensions_mut().insert(AuthUser(claims));
    Ok(next.run(req).await)
}
