use axum::Json;
use serde::Serialize;
use tracing::instrument;

use crate::middleware::auth::AuthUser;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub subject: String,
    /// Granted permissions, sorted
    pub permissions: Vec<String>,
}

/// Identity of the caller as established by the token
#[instrument(skip(auth_user), fields(subject = %auth_user.subject()))]
pub async fn get_me(auth_user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        subject: auth_user.0.subject.clone(),
        permissions: auth_user.0.permissions().iter().cloned().collect(),
    })
}
