use anyhow::anyhow;
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect},
};
use casting_config::AuthConfig;
use casting_core::ApiError;
use serde::Serialize;
use tracing::{info, instrument};
use url::Url;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Unauthenticated liveness greeting
pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        success: true,
        message: "Welcome",
    })
}

/// Identity-provider authorize URL requesting an implicit-flow access token
/// for the API audience.
pub fn login_url(config: &AuthConfig) -> Result<Url, ApiError> {
    let client_id = config
        .client_id
        .as_deref()
        .ok_or_else(|| ApiError::internal(anyhow!("AUTH0_CLIENT_ID is not configured")))?;
    let callback_url = config
        .callback_url
        .as_deref()
        .ok_or_else(|| ApiError::internal(anyhow!("AUTH0_CALLBACK_URL is not configured")))?;

    Url::parse_with_params(
        &format!("https://{}/authorize", config.domain),
        &[
            ("audience", config.audience.as_str()),
            ("response_type", "token"),
            ("client_id", client_id),
            ("redirect_uri", callback_url),
        ],
    )
    .map_err(ApiError::internal)
}

/// Redirect to the identity provider's login page
#[instrument(skip(state))]
pub async fn login(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let url = login_url(&state.auth_config)?;
    info!(domain = %state.auth_config.domain, "Redirecting to identity provider login");
    Ok(Redirect::to(url.as_str()))
}
