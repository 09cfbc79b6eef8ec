use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{login, welcome};

pub fn init_home_router() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/login", get(login))
}
