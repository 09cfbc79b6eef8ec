use casting_auth::AuthPipeline;
use casting_config::{AuthConfig, CorsConfig};
use casting_core::AuthError;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: AuthPipeline,
    pub auth_config: AuthConfig,
    pub cors_config: CorsConfig,
}

impl AppState {
    pub fn new(auth_config: AuthConfig, cors_config: CorsConfig) -> Result<Self, AuthError> {
        Ok(Self {
            auth: AuthPipeline::from_config(&auth_config)?,
            auth_config,
            cors_config,
        })
    }
}

/// Builds the state from the environment. Startup fails on missing or invalid
/// identity-provider settings.
pub fn init_app_state() -> anyhow::Result<AppState> {
    let auth_config = AuthConfig::from_env()?;
    let cors_config = CorsConfig::from_env();
    Ok(AppState::new(auth_config, cors_config)?)
}
