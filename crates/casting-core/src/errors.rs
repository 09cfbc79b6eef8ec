//! Error types surfaced by the HTTP layer.
//!
//! [`AuthError`] is the closed taxonomy produced by the token pipeline. Every
//! variant maps to a fixed HTTP status, a stable machine-readable `code` and a
//! human-readable `description`; the [`render`] function (and the
//! [`IntoResponse`] impl built on it) is the single place where those errors
//! become responses:
//!
//! ```json
//! {"success": false, "error": 401, "message": {"code": "token_expired", "description": "Token expired."}}
//! ```
//!
//! Descriptions are static strings. Details carried by a variant (the declared
//! algorithm, the fetch failure cause) are for logs only and are never rendered.
//!
//! [`ApiError`] covers the rest of the HTTP surface (unknown routes, wrong
//! methods, startup-time misconfiguration reached at request time).

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error as ThisError;

/// Reason strings for [`AuthError::MalformedAuthorizationHeader`].
pub mod malformed {
    pub const SCHEME: &str = "Authorization header must start with \"Bearer\".";
    pub const TOKEN_NOT_FOUND: &str = "Token not found.";
    pub const NOT_BEARER_TOKEN: &str = "Authorization header must be bearer token.";
    pub const TOKEN_MALFORMED: &str = "Authorization malformed.";
}

/// Failure of any stage of the authorization pipeline.
///
/// Only [`AuthError::KeySetFetchFailed`] describes a server-side condition;
/// every other variant is a permanent verdict on the presented token.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum AuthError {
    /// No `Authorization` header on the request.
    #[error("authorization header is missing")]
    AuthorizationHeaderMissing,

    /// The header is not exactly `Bearer <token>`, or the token is not a
    /// decodable three-segment JWT.
    #[error("malformed authorization header: {0}")]
    MalformedAuthorizationHeader(&'static str),

    /// The token header declares an algorithm other than RS256.
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The token header carries no `kid`.
    #[error("token header has no key id")]
    MissingKeyId,

    /// The `kid` is not in the key set, even after a refresh.
    #[error("no signing key matches the token key id")]
    UnknownSigningKey,

    /// The signature does not verify against the resolved key.
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// Issuer or audience mismatch, or a required claim is missing or mistyped.
    #[error("token claims are invalid")]
    ClaimsInvalid,

    /// `exp` is not strictly in the future.
    #[error("token has expired")]
    TokenExpired,

    /// The token carries no `permissions` claim at all.
    #[error("permissions claim is missing")]
    PermissionsClaimMissing,

    /// The required permission is not granted by the token.
    #[error("required permission is not granted")]
    PermissionDenied,

    /// The identity provider's key set could not be fetched or parsed.
    #[error("failed to fetch signing keys: {0}")]
    KeySetFetchFailed(String),
}

impl AuthError {
    /// HTTP status; always one of 400, 401, 403 or 500.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::PermissionsClaimMissing => StatusCode::BAD_REQUEST,
            AuthError::PermissionDenied => StatusCode::FORBIDDEN,
            AuthError::KeySetFetchFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::AuthorizationHeaderMissing => "authorization_header_missing",
            AuthError::MalformedAuthorizationHeader(_)
            | AuthError::UnsupportedAlgorithm(_)
            | AuthError::MissingKeyId
            | AuthError::UnknownSigningKey
            | AuthError::SignatureInvalid => "invalid_header",
            AuthError::ClaimsInvalid | AuthError::PermissionsClaimMissing => "invalid_claims",
            AuthError::TokenExpired => "token_expired",
            AuthError::PermissionDenied => "unauthorized",
            AuthError::KeySetFetchFailed(_) => "key_set_unavailable",
        }
    }

    /// Client-facing description. Never includes token contents or fetch details.
    pub fn description(&self) -> &'static str {
        match self {
            AuthError::AuthorizationHeaderMissing => "Authorization header is expected.",
            AuthError::MalformedAuthorizationHeader(reason) => *reason,
            AuthError::UnsupportedAlgorithm(_) => "Unsupported signing algorithm.",
            AuthError::MissingKeyId => malformed::TOKEN_MALFORMED,
            AuthError::UnknownSigningKey => "Unable to find the appropriate key.",
            AuthError::SignatureInvalid => "Unable to verify token signature.",
            AuthError::ClaimsInvalid => {
                "Incorrect claims. Please, check the audience and issuer."
            }
            AuthError::TokenExpired => "Token expired.",
            AuthError::PermissionsClaimMissing => "Permissions not included in JWT.",
            AuthError::PermissionDenied => "Permission not found.",
            AuthError::KeySetFetchFailed(_) => "Unable to fetch signing keys.",
        }
    }

    /// True for the one server-side condition in the taxonomy.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AuthError::KeySetFetchFailed(_))
    }
}

/// `message` object of a rendered [`AuthError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    pub code: &'static str,
    pub description: &'static str,
}

/// JSON body of a rendered [`AuthError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: u16,
    pub message: ErrorMessage,
}

impl From<&AuthError> for ErrorBody {
    fn from(err: &AuthError) -> Self {
        Self {
            success: false,
            error: err.status().as_u16(),
            message: ErrorMessage {
                code: err.code(),
                description: err.description(),
            },
        }
    }
}

/// Error boundary: turns an [`AuthError`] into its HTTP response.
pub fn render(err: &AuthError) -> Response {
    if err.is_server_error() {
        tracing::error!(error = %err, code = err.code(), "authorization pipeline failed");
    }
    (err.status(), Json(ErrorBody::from(err))).into_response()
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        render(&self)
    }
}

/// Error for the non-authorization parts of the HTTP surface.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: Error,
}

impl ApiError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, anyhow::anyhow!("resource not found"))
    }

    pub fn method_not_allowed() -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            anyhow::anyhow!("method not allowed"),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.error, "request failed");
        }

        // 5xx details stay in the logs.
        let message = if self.status.is_server_error() {
            "internal server error".to_string()
        } else {
            self.error.to_string()
        };

        let body = Json(json!({
            "success": false,
            "error": self.status.as_u16(),
            "message": message,
        }));

        (self.status, body).into_response()
    }
}
