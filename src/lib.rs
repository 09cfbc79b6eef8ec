//! # Casting Agency API
//!
//! HTTP front of the Casting Agency service: every protected route is gated by a
//! bearer token issued by an external identity provider and by the permission
//! the route requires.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── casting-core/           # AuthError taxonomy, error boundary, permission names
//! ├── casting-config/         # Environment configuration
//! ├── casting-auth/           # Key cache, token verifier, permission enforcer
//! ├── casting-observability/  # Tracing subscriber, request logging, Prometheus
//! └── casting-cli/            # Operator CLI
//! src/
//! ├── middleware/             # AuthUser extractor, permission extractors and layer
//! ├── modules/                # Route modules (home, profile)
//! ├── router.rs               # Router assembly, CORS, fallbacks
//! └── state.rs                # Shared application state
//! ```
//!
//! Each route module follows the same structure:
//!
//! - `controller.rs`: HTTP handlers
//! - `router.rs`: Axum router configuration
//!
//! ## Authorization
//!
//! Protected routes declare a permission from [`casting_core::permissions`],
//! either with a typed extractor or with a route layer:
//!
//! ```ignore
//! async fn list_movies(RequireGetMovies(user): RequireGetMovies) -> impl IntoResponse { /* ... */ }
//!
//! Router::new()
//!     .route("/movies", get(list_movies))
//!     .route_layer(middleware::from_fn_with_state(
//!         PermissionGuard::new(&state, permissions::GET_MOVIES),
//!         enforce_permission,
//!     ));
//! ```
//!
//! Failures render as
//! `{"success": false, "error": <status>, "message": {"code": ..., "description": ...}}`
//! with status 400, 401, 403 or 500.

pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
