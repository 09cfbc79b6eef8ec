//! # Signing-key cache
//!
//! Holds the identity provider's published RSA signing keys, indexed by key id.
//!
//! ## Snapshot model
//! Keys live in an immutable [`KeySetSnapshot`] behind an `ArcSwapOption`.
//! A refresh builds a complete new snapshot and swaps it in, so readers see
//! either the old set or the new set, never a mix. A failed refresh leaves the
//! previous snapshot in place for keys it already knows.
//!
//! ## Refresh policy
//! The first lookup, and any lookup for a key id missing from the current
//! snapshot, triggers one refresh. Concurrent refreshes collapse into a single
//! in-flight fetch whose outcome, success or failure, is shared by every
//! waiter. Each fetch is bounded by the configured timeout.
//!
//! ## Key admission
//! Only keys usable for RS256 verification are installed: `kty` = `RSA`, a
//! non-empty `kid`, valid `n`/`e`, `use` absent or `sig`, `alg` absent or
//! `RS256`. A document with no admissible key counts as a failed fetch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, instrument, warn};

use casting_config::AuthConfig;
use casting_core::AuthError;

/// A JSON Web Key as published by the identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Jwk {
    /// Key ID.
    #[serde(default)]
    pub kid: Option<String>,
    /// Key type (e.g., "RSA").
    #[serde(default)]
    pub kty: Option<String>,
    /// Algorithm (e.g., "RS256").
    #[serde(default)]
    pub alg: Option<String>,
    /// Key usage (e.g., "sig").
    #[serde(rename = "use", default)]
    pub key_use: Option<String>,
    /// RSA modulus, base64url.
    #[serde(default)]
    pub n: Option<String>,
    /// RSA exponent, base64url.
    #[serde(default)]
    pub e: Option<String>,
}

/// A JSON Web Key Set document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// A verification key admitted from the key set.
#[derive(Clone)]
pub struct SigningKey {
    pub key_id: String,
    pub algorithm: Algorithm,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Admits `jwk` as an RS256 verification key, or says why it was rejected.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, &'static str> {
        let kid = jwk
            .kid
            .as_deref()
            .filter(|kid| !kid.is_empty())
            .ok_or("missing kid")?;
        if jwk.kty.as_deref() != Some("RSA") {
            return Err("key type is not RSA");
        }
        if jwk.key_use.as_deref().is_some_and(|u| u != "sig") {
            return Err("key is not a signing key");
        }
        if jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
            return Err("key algorithm is not RS256");
        }

        let (n, e) = jwk
            .n
            .as_deref()
            .zip(jwk.e.as_deref())
            .ok_or("missing RSA components")?;
        let decoding_key =
            DecodingKey::from_rsa_components(n, e).map_err(|_| "invalid RSA components")?;

        Ok(Self {
            key_id: kid.to_string(),
            algorithm: Algorithm::RS256,
            decoding_key,
        })
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

/// Immutable set of signing keys from one successful fetch.
#[derive(Debug)]
pub struct KeySetSnapshot {
    keys: HashMap<String, Arc<SigningKey>>,
    fetched_at: DateTime<Utc>,
}

impl KeySetSnapshot {
    /// Builds a snapshot from a fetched document, skipping keys that cannot
    /// verify RS256 tokens.
    ///
    /// # Errors
    ///
    /// [`AuthError::KeySetFetchFailed`] if no key is admissible.
    pub fn from_jwk_set(set: JwkSet) -> Result<Self, AuthError> {
        let mut keys = HashMap::with_capacity(set.keys.len());

        for jwk in &set.keys {
            match SigningKey::from_jwk(jwk) {
                Ok(key) => {
                    if keys.contains_key(&key.key_id) {
                        warn!(kid = %key.key_id, "Duplicate kid in key set, keeping the first");
                        continue;
                    }
                    keys.insert(key.key_id.clone(), Arc::new(key));
                }
                Err(reason) => {
                    warn!(kid = ?jwk.kid, reason, "Skipping unusable key in key set");
                }
            }
        }

        if keys.is_empty() {
            return Err(AuthError::KeySetFetchFailed(
                "key set contains no usable RS256 signing keys".to_string(),
            ));
        }

        Ok(Self {
            keys,
            fetched_at: Utc::now(),
        })
    }

    pub fn get(&self, key_id: &str) -> Option<Arc<SigningKey>> {
        self.keys.get(key_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key ids in this snapshot, sorted.
    pub fn key_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// Where the cache gets key-set documents from.
pub trait KeySetSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<JwkSet, AuthError>> + Send;
}

/// Fetches the key set from the identity provider's published endpoint.
#[derive(Debug, Clone)]
pub struct HttpKeySetSource {
    client: reqwest::Client,
    url: String,
}

impl HttpKeySetSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let url = url.into();
        if !url.starts_with("https://") {
            warn!(jwks_url = %url, "JWKS URL should use HTTPS");
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AuthError::KeySetFetchFailed(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            AuthError::KeySetFetchFailed(format!("request to {} failed: {e}", self.url))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::KeySetFetchFailed(format!(
                "{} returned status {status}",
                self.url
            )));
        }

        response.json::<JwkSet>().await.map_err(|e| {
            AuthError::KeySetFetchFailed(format!("malformed key set from {}: {e}", self.url))
        })
    }
}

type Flight = OnceCell<Result<Arc<KeySetSnapshot>, AuthError>>;

/// Process-wide cache of signing keys, refreshed lazily from a [`KeySetSource`].
pub struct SigningKeyCache<S = HttpKeySetSource> {
    source: S,
    fetch_timeout: Duration,
    snapshot: ArcSwapOption<KeySetSnapshot>,
    in_flight: Mutex<Option<Arc<Flight>>>,
}

impl<S> std::fmt::Debug for SigningKeyCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyCache")
            .field("fetch_timeout", &self.fetch_timeout)
            .field("keys", &self.snapshot.load().as_ref().map(|s| s.len()))
            .finish_non_exhaustive()
    }
}

impl SigningKeyCache<HttpKeySetSource> {
    /// Cache backed by the configured key-set endpoint.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let source = HttpKeySetSource::new(&config.jwks_url, config.jwks_fetch_timeout)?;
        Ok(Self::new(source, config.jwks_fetch_timeout))
    }
}

impl<S: KeySetSource> SigningKeyCache<S> {
    pub fn new(source: S, fetch_timeout: Duration) -> Self {
        Self {
            source,
            fetch_timeout,
            snapshot: ArcSwapOption::empty(),
            in_flight: Mutex::new(None),
        }
    }

    /// The currently installed snapshot, if any fetch has succeeded yet.
    pub fn snapshot(&self) -> Option<Arc<KeySetSnapshot>> {
        self.snapshot.load_full()
    }

    /// Resolves `key_id`, refreshing once if it is not in the current snapshot.
    ///
    /// # Errors
    ///
    /// - [`AuthError::UnknownSigningKey`] if the key is still absent after the refresh
    /// - [`AuthError::KeySetFetchFailed`] if the refresh itself failed
    #[instrument(skip(self))]
    pub async fn get_key(&self, key_id: &str) -> Result<Arc<SigningKey>, AuthError> {
        let observed = self.snapshot.load_full();
        if let Some(key) = observed.as_ref().and_then(|s| s.get(key_id)) {
            return Ok(key);
        }

        debug!("Signing key not cached, refreshing key set");
        let snapshot = self.refresh_after_miss(observed).await?;

        snapshot.get(key_id).ok_or_else(|| {
            warn!(kid = %key_id, "No signing key matches kid after refresh");
            AuthError::UnknownSigningKey
        })
    }

    /// Fetches a fresh key set now, joining a refresh already in flight.
    pub async fn refresh(&self) -> Result<Arc<KeySetSnapshot>, AuthError> {
        let flight = self
            .in_flight
            .lock()
            .await
            .get_or_insert_with(Default::default)
            .clone();
        self.join(flight).await
    }

    async fn refresh_after_miss(
        &self,
        observed: Option<Arc<KeySetSnapshot>>,
    ) -> Result<Arc<KeySetSnapshot>, AuthError> {
        let flight = {
            let mut slot = self.in_flight.lock().await;

            // A refresh completed since we looked; use its result instead of fetching again.
            if let Some(current) = self.snapshot.load_full() {
                let replaced = observed
                    .as_ref()
                    .is_none_or(|seen| !Arc::ptr_eq(seen, &current));
                if replaced {
                    return Ok(current);
                }
            }

            slot.get_or_insert_with(Default::default).clone()
        };

        self.join(flight).await
    }

    async fn join(&self, flight: Arc<Flight>) -> Result<Arc<KeySetSnapshot>, AuthError> {
        flight
            .get_or_init(|| self.fetch_and_install())
            .await
            .clone()
    }

    async fn fetch_and_install(&self) -> Result<Arc<KeySetSnapshot>, AuthError> {
        let started = Instant::now();
        info!("Fetching signing keys from identity provider");

        let fetched = match tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::KeySetFetchFailed(format!(
                "key set fetch timed out after {:?}",
                self.fetch_timeout
            ))),
        };

        let outcome = fetched.and_then(KeySetSnapshot::from_jwk_set).map(Arc::new);
        match &outcome {
            Ok(snapshot) => {
                self.snapshot.store(Some(Arc::clone(snapshot)));
                counter!("jwks_fetches_total", "status" => "success").increment(1);
                info!(
                    keys = snapshot.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Signing key cache updated"
                );
            }
            Err(err) => {
                counter!("jwks_fetches_total", "status" => "error").increment(1);
                error!(error = %err, "Failed to refresh signing keys");
            }
        }

        // Retire this flight: later misses start a new fetch.
        *self.in_flight.lock().await = None;

        outcome
    }
}
