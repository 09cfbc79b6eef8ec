//! Identity-provider configuration.
//!
//! # Environment Variables
//!
//! - `AUTH0_DOMAIN` (required): identity provider domain, e.g. `casting.eu.auth0.com`
//! - `API_AUDIENCE` (required): audience the access tokens must be issued for
//! - `JWKS_URL`: key-set endpoint (default: `https://{domain}/.well-known/jwks.json`)
//! - `JWKS_FETCH_TIMEOUT_SECS`: timeout of one key-set fetch (default: 5)
//! - `JWKS_PREFETCH`: warm the key cache at startup (default: false)
//! - `JWT_LEEWAY_SECS`: clock-skew allowance applied to `exp` (default: 0)
//! - `AUTH0_CLIENT_ID`, `AUTH0_CALLBACK_URL`: only used to build the login redirect

use std::env;
use std::time::Duration;

use anyhow::{Context, bail};

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthConfig {
    /// Identity provider domain, without scheme.
    pub domain: String,
    /// Expected `iss` claim.
    pub issuer: String,
    /// Expected `aud` claim.
    pub audience: String,
    /// Published key-set endpoint.
    pub jwks_url: String,
    pub jwks_fetch_timeout: Duration,
    pub jwks_prefetch: bool,
    /// Allowed clock skew in seconds when checking `exp`.
    pub leeway_secs: u64,
    pub client_id: Option<String>,
    pub callback_url: Option<String>,
}

impl AuthConfig {
    /// Builds the configuration for `domain` and `audience` with every optional
    /// setting at its default.
    pub fn new(domain: &str, audience: &str) -> anyhow::Result<Self> {
        let domain = normalize_domain(domain);
        if domain.is_empty() {
            bail!("identity provider domain must not be empty");
        }
        if audience.trim().is_empty() {
            bail!("API audience must not be empty");
        }

        Ok(Self {
            issuer: format!("https://{domain}/"),
            jwks_url: format!("https://{domain}/.well-known/jwks.json"),
            domain,
            audience: audience.trim().to_string(),
            jwks_fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            jwks_prefetch: false,
            leeway_secs: 0,
            client_id: None,
            callback_url: None,
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let domain = lookup("AUTH0_DOMAIN").context("AUTH0_DOMAIN must be set")?;
        let audience = lookup("API_AUDIENCE").context("API_AUDIENCE must be set")?;
        let mut config = Self::new(&domain, &audience)?;

        if let Some(url) = lookup("JWKS_URL").filter(|u| !u.trim().is_empty()) {
            config.jwks_url = url.trim().to_string();
        }
        if let Some(secs) = lookup("JWKS_FETCH_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("JWKS_FETCH_TIMEOUT_SECS is not a number: {secs}"))?;
            if secs == 0 {
                bail!("JWKS_FETCH_TIMEOUT_SECS must be greater than zero");
            }
            config.jwks_fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = lookup("JWT_LEEWAY_SECS") {
            config.leeway_secs = secs
                .parse()
                .with_context(|| format!("JWT_LEEWAY_SECS is not a number: {secs}"))?;
        }
        config.jwks_prefetch = lookup("JWKS_PREFETCH")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        config.client_id = lookup("AUTH0_CLIENT_ID").filter(|v| !v.is_empty());
        config.callback_url = lookup("AUTH0_CALLBACK_URL").filter(|v| !v.is_empty());

        if !config.jwks_url.starts_with("https://") {
            tracing::warn!(jwks_url = %config.jwks_url, "JWKS URL should use HTTPS");
        }

        Ok(config)
    }
}

/// Strips an accidental scheme and trailing slashes from the configured domain.
fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim();
    let domain = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain);
    domain.trim_end_matches('/').to_string()
}
