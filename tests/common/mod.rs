#![allow(dead_code)]

use axum::{Router, body::Body, http::Request, response::Response};
use casting_agency::router::init_router;
use casting_agency::state::AppState;
use casting_auth::testutil::{self, PRIMARY, TestKey};
use casting_config::{AuthConfig, CorsConfig};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// A JWKS endpoint publishing the primary test key.
pub async fn jwks_server() -> MockServer {
    jwks_server_with(&[&PRIMARY]).await
}

pub async fn jwks_server_with(keys: &[&TestKey]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(testutil::jwks_json(keys)))
        .mount(&server)
        .await;
    server
}

pub fn auth_config(server: &MockServer) -> AuthConfig {
    let mut config = AuthConfig::new("casting.test.auth0.com", testutil::AUDIENCE).unwrap();
    config.jwks_url = format!("{}{JWKS_PATH}", server.uri());
    config.jwks_fetch_timeout = std::time::Duration::from_secs(2);
    config.client_id = Some("client-123".to_string());
    config.callback_url = Some("http://localhost:8080/callback".to_string());
    config
}

pub fn app_state(server: &MockServer) -> AppState {
    let cors_config = CorsConfig {
        allowed_origins: vec!["*".to_string()],
    };
    AppState::new(auth_config(server), cors_config).unwrap()
}

pub fn app(server: &MockServer) -> Router {
    init_router(app_state(server), None)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    get_with_header(uri, &format!("Bearer {token}"))
}

pub fn get_with_header(uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", authorization)
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Asserts the rendered auth error shape and returns `message.code`.
pub fn error_code(body: &Value, status: u16) -> String {
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], status);
    assert!(body["message"]["description"].is_string());
    body["message"]["code"].as_str().unwrap().to_string()
}
