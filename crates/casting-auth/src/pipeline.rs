//! Extractor, verifier and enforcer composed into one authorization call.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use casting_config::AuthConfig;
use casting_core::AuthError;

use crate::claims::VerifiedClaims;
use crate::enforcer;
use crate::extractor::extract_bearer;
use crate::jwks::{HttpKeySetSource, KeySetSource, SigningKeyCache};
use crate::verifier::TokenVerifier;

/// Authorizes requests: extract the bearer token, verify it, enforce a permission.
///
/// Cheap to clone; clones share the verifier and its signing-key cache.
pub struct AuthPipeline<S = HttpKeySetSource> {
    verifier: Arc<TokenVerifier<S>>,
}

impl<S> Clone for AuthPipeline<S> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
        }
    }
}

impl<S> std::fmt::Debug for AuthPipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthPipeline")
            .field("verifier", &self.verifier)
            .finish()
    }
}

impl AuthPipeline<HttpKeySetSource> {
    /// Pipeline fetching keys from the configured key-set endpoint.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let keys = Arc::new(SigningKeyCache::from_config(config)?);
        Ok(Self::new(TokenVerifier::new(keys, config)))
    }
}

impl<S: KeySetSource> AuthPipeline<S> {
    pub fn new(verifier: TokenVerifier<S>) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    /// Pipeline over an arbitrary key source.
    pub fn with_source(source: S, config: &AuthConfig) -> Self {
        let keys = Arc::new(SigningKeyCache::new(source, config.jwks_fetch_timeout));
        Self::new(TokenVerifier::new(keys, config))
    }

    pub fn verifier(&self) -> &TokenVerifier<S> {
        &self.verifier
    }

    pub fn keys(&self) -> &Arc<SigningKeyCache<S>> {
        self.verifier.keys()
    }

    /// Authorizes a request from its raw `Authorization` header value.
    ///
    /// `required` is the permission the route needs; pass
    /// [`casting_core::permissions::AUTHENTICATED`] for routes that only need a
    /// verified identity. The first failing stage decides the error.
    pub async fn authorize(
        &self,
        raw_header: Option<&[u8]>,
        required: &str,
    ) -> Result<VerifiedClaims, AuthError> {
        let outcome = self.run(raw_header, required).await;

        match &outcome {
            Ok(claims) => {
                counter!("auth_decisions_total", "outcome" => "allowed", "code" => "ok")
                    .increment(1);
                debug!(subject = %claims.subject, permission = required, "Request authorized");
            }
            Err(err) => {
                counter!("auth_decisions_total", "outcome" => "rejected", "code" => err.code())
                    .increment(1);
                if err.is_server_error() {
                    warn!(code = err.code(), permission = required, "Authorization unavailable");
                } else {
                    debug!(code = err.code(), permission = required, "Request rejected");
                }
            }
        }

        outcome
    }

    async fn run(
        &self,
        raw_header: Option<&[u8]>,
        required: &str,
    ) -> Result<VerifiedClaims, AuthError> {
        let token = extract_bearer(raw_header)?;
        let claims = self.verifier.verify(token).await?;
        enforcer::require(claims, required)
    }
}
