use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tracing::{Level, error, info, warn};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events pass the default filter at the configured level.
const APP_CRATES: &[&str] = &[
    "casting_agency",
    "casting_auth",
    "casting_cli",
    "casting_config",
    "casting_core",
    "casting_observability",
];

/// Default filter when `RUST_LOG` is unset: app crates at `level`, noisy
/// dependencies at `warn`.
pub fn default_filter(level: &str) -> String {
    let mut directives: Vec<String> = APP_CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect();
    directives.extend(
        ["tower_http=warn", "hyper=warn", "reqwest=warn", "h2=warn"].map(String::from),
    );
    directives.join(",")
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        EnvFilter::new(default_filter(&level))
    })
}

/// Installs the global tracing subscriber.
///
/// # Configuration
///
/// - **Console**: compact format, filtered by `RUST_LOG` (fallback `LOG_LEVEL`, default `info`)
/// - **JSON file**: daily-rolling `casting-agency.json` under `LOG_DIR`, only when `LOG_DIR` is set
///
/// Panics if a global subscriber is already installed.
pub fn init_tracing() {
    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter());

    tracing_subscriber::registry()
        .with(console_layer)
        .with(json_file_layer())
        .init();
}

#[cfg(feature = "observability")]
fn json_file_layer<S>() -> Option<Box<dyn Layer<S> + Send + Sync>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    use tracing_appender::rolling::{RollingFileAppender, Rotation};

    let log_dir = std::env::var("LOG_DIR").ok().filter(|dir| !dir.is_empty())?;
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory {log_dir}: {e}. File logging disabled.");
        return None;
    }

    // Structured logs for ingestion (Loki and friends)
    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "casting-agency.json");
    let layer = fmt::layer()
        .json()
        .with_writer(appender)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(env_filter());

    Some(Box::new(layer))
}

#[cfg(not(feature = "observability"))]
fn json_file_layer<S>() -> Option<Box<dyn Layer<S> + Send + Sync>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    None
}

/// Level of the completion log line for a response status.
pub fn level_for_status(status: u16) -> Level {
    match status {
        400..=499 => Level::WARN,
        500..=599 => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Logs every request with a request id, the matched route, status and latency.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let request_id = uuid::Uuid::new_v4().to_string();

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Incoming request"
    );

    let response = next.run(req).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    let level = level_for_status(status);
    if level == Level::ERROR {
        error!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status,
            latency_ms,
            "Server error"
        );
    } else if level == Level::WARN {
        warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status,
            latency_ms,
            "Client error"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status,
            latency_ms,
            "Request completed"
        );
    }

    response
}
