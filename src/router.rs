use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware};
use casting_config::CorsConfig;
use casting_core::ApiError;
use casting_observability::{PrometheusHandle, logging_middleware, metrics_app, metrics_middleware};
use tower_http::cors::{Any, CorsLayer};

use crate::modules::home::router::init_home_router;
use crate::modules::profile::router::init_profile_router;
use crate::state::AppState;

/// Builds the application router. `/metrics` is only mounted when a
/// Prometheus recorder was installed.
pub fn init_router(state: AppState, metrics: Option<PrometheusHandle>) -> Router {
    let mut app = Router::new()
        .merge(init_home_router())
        .merge(init_profile_router())
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state.clone());

    if let Some(handle) = metrics {
        app = app.merge(metrics_app(handle));
    }

    app.layer(cors_layer(&state.cors_config))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    layer.allow_origin(allowed_origins).allow_credentials(true)
}
