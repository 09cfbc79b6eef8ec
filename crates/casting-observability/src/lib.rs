//! Casting Agency Observability Module
//!
//! Provides:
//! - Tracing subscriber setup (console, optional rolling JSON file)
//! - HTTP request/response logging
//! - Metrics collection via Prometheus
//!
//! File logging and metrics can be disabled at compile time via the
//! `observability` feature flag. At runtime, metrics are further controlled via
//! the `OBSERVABILITY_ENABLED` environment variable.
//!
//! # Examples
//!
//! ```no_run
//! use casting_observability::{init_metrics, init_tracing};
//!
//! #[tokio::main]
//! async fn main() {
//!     init_tracing();
//!     let _metrics = init_metrics().expect("metrics recorder");
//!     // ... application code ...
//! }
//! ```

pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

pub use logging::{init_tracing, logging_middleware};

#[cfg(feature = "observability")]
pub use metrics::{init_metrics, is_observability_enabled, metrics_app, metrics_middleware};
#[cfg(feature = "observability")]
pub use metrics_exporter_prometheus::PrometheusHandle;

// No-op stubs when observability is disabled
#[cfg(not(feature = "observability"))]
pub mod stubs {
    use axum::{Router, extract::Request, middleware::Next, response::Response};

    /// Stand-in for the Prometheus handle; never constructed.
    #[derive(Debug, Clone)]
    pub enum PrometheusHandle {}

    pub fn is_observability_enabled() -> bool {
        false
    }

    pub async fn metrics_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub fn init_metrics() -> Result<Option<PrometheusHandle>, std::convert::Infallible> {
        Ok(None)
    }

    pub fn metrics_app(handle: PrometheusHandle) -> Router {
        match handle {}
    }
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
