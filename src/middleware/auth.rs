use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use casting_auth::VerifiedClaims;
use casting_core::{AuthError, permissions};

use crate::state::AppState;

/// Raw `Authorization` header value, if present.
pub fn authorization_header(parts: &Parts) -> Option<&[u8]> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .map(|value| value.as_bytes())
}

/// Extractor that verifies the bearer token and provides the caller's claims.
///
/// Needs a valid token carrying a `permissions` claim, but no specific
/// permission. Reuses the identity already established by an
/// [`enforce_permission`](crate::middleware::permission::enforce_permission)
/// layer instead of verifying the token a second time.
#[derive(Debug, Clone)]
pub struct AuthUser(pub VerifiedClaims);

impl AuthUser {
    /// Subject at the identity provider
    pub fn subject(&self) -> &str {
        &self.0.subject
    }

    /// Check if the caller has a specific permission
    pub fn has_permission(&self, permission: &str) -> bool {
        self.0.has_permission(permission)
    }

    /// Check if the caller has any of the specified permissions
    pub fn has_any_permission(&self, permissions: &[&str]) -> bool {
        self.0.has_any_permission(permissions)
    }

    /// Check if the caller has all of the specified permissions
    pub fn has_all_permissions(&self, permissions: &[&str]) -> bool {
        permissions.iter().all(|p| self.has_permission(p))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let claims = state
            .auth
            .authorize(authorization_header(parts), permissions::AUTHENTICATED)
            .await?;

        Ok(AuthUser(claims))
    }
}

/// Helper macro to create permission check extractors.
///
/// The generated extractor runs the full pipeline with the given permission, so
/// a request failing several checks reports the first failing stage.
#[macro_export]
macro_rules! require_permission {
    ($name:ident, $permission:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = casting_core::AuthError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                if let Some(user) = parts.extensions.get::<$crate::middleware::auth::AuthUser>() {
                    let claims = casting_auth::require(user.0.clone(), $permission)?;
                    return Ok($name($crate::middleware::auth::AuthUser(claims)));
                }

                let claims = state
                    .auth
                    .authorize(
                        $crate::middleware::auth::authorization_header(parts),
                        $permission,
                    )
                    .await?;

                Ok($name($crate::middleware::auth::AuthUser(claims)))
            }
        }
    };
}

// Movies permissions
require_permission!(RequireGetMovies, permissions::GET_MOVIES);
require_permission!(RequirePostMovies, permissions::POST_MOVIES);
require_permission!(RequirePatchMovies, permissions::PATCH_MOVIES);
require_permission!(RequireDeleteMovies, permissions::DELETE_MOVIES);

// Actors permissions
require_permission!(RequireGetActors, permissions::GET_ACTORS);
require_permission!(RequirePostActors, permissions::POST_ACTORS);
require_permission!(RequirePatchActors, permissions::PATCH_ACTORS);
require_permission!(RequireDeleteActors, permissions::DELETE_ACTORS);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn auth_user(granted: &[&str]) -> AuthUser {
        AuthUser(VerifiedClaims::new(
            "auth0|1",
            "https://casting.test.auth0.com/",
            "casting",
            DateTime::from_timestamp(4_102_444_800, 0).unwrap(),
            Some(granted.iter().map(|p| p.to_string()).collect::<Vec<_>>()),
        ))
    }

    #[test]
    fn test_has_permission() {
        let user = auth_user(&[permissions::GET_MOVIES, permissions::POST_MOVIES]);

        assert!(user.has_permission(permissions::GET_MOVIES));
        assert!(user.has_permission(permissions::POST_MOVIES));
        assert!(!user.has_permission(permissions::DELETE_MOVIES));
    }

    #[test]
    fn test_has_any_permission() {
        let user = auth_user(&[permissions::GET_ACTORS]);

        assert!(user.has_any_permission(&[permissions::GET_ACTORS, permissions::DELETE_ACTORS]));
        assert!(!user.has_any_permission(&[permissions::POST_ACTORS, permissions::DELETE_ACTORS]));
    }

    #[test]
    fn test_has_all_permissions() {
        let user = auth_user(&[
            permissions::GET_MOVIES,
            permissions::GET_ACTORS,
            permissions::PATCH_ACTORS,
        ]);

        assert!(user.has_all_permissions(&[permissions::GET_MOVIES, permissions::GET_ACTORS]));
        assert!(!user.has_all_permissions(&[permissions::GET_MOVIES, permissions::DELETE_MOVIES]));
    }

    #[test]
    fn test_subject() {
        assert_eq!(auth_user(&[]).subject(), "auth0|1");
    }
}
