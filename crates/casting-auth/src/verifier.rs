//! RS256 access-token verification.

use std::sync::Arc;

use chrono::DateTime;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use tracing::debug;

use casting_config::AuthConfig;
use casting_core::AuthError;
use casting_core::errors::malformed;

use crate::claims::{TokenClaims, VerifiedClaims};
use crate::jwks::{HttpKeySetSource, KeySetSource, SigningKeyCache};

/// Verifies access tokens against the signing-key cache and the configured
/// issuer and audience.
///
/// Checks run in a fixed order: header shape, algorithm, key id, key lookup,
/// signature, expiry, then issuer and audience. The first failure wins, so an
/// expired token is always reported as expired.
pub struct TokenVerifier<S = HttpKeySetSource> {
    keys: Arc<SigningKeyCache<S>>,
    validation: Validation,
    issuer: String,
    audience: String,
    leeway_secs: i64,
}

impl<S> std::fmt::Debug for TokenVerifier<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("keys", &self.keys)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}

impl<S: KeySetSource> TokenVerifier<S> {
    pub fn new(keys: Arc<SigningKeyCache<S>>, config: &AuthConfig) -> Self {
        // Signature and claim presence only; expiry, issuer and audience are
        // compared below in that order.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            keys,
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            leeway_secs: i64::try_from(config.leeway_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn keys(&self) -> &Arc<SigningKeyCache<S>> {
        &self.keys
    }

    /// Verifies `token` against the current time.
    pub async fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        self.verify_at(token, chrono::Utc::now().timestamp()).await
    }

    /// Verifies `token` as of `now` (seconds since the Unix epoch).
    ///
    /// # Errors
    ///
    /// - [`AuthError::MalformedAuthorizationHeader`] if the token is not a decodable JWT
    /// - [`AuthError::UnsupportedAlgorithm`] for any algorithm but RS256
    /// - [`AuthError::MissingKeyId`] if the header has no `kid`
    /// - [`AuthError::UnknownSigningKey`] / [`AuthError::KeySetFetchFailed`] from key lookup
    /// - [`AuthError::SignatureInvalid`] if the signature does not verify
    /// - [`AuthError::TokenExpired`] unless `exp` is strictly after `now`
    /// - [`AuthError::ClaimsInvalid`] on issuer or audience mismatch, or a missing/mistyped claim
    pub async fn verify_at(&self, token: &str, now: i64) -> Result<VerifiedClaims, AuthError> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "Token header could not be decoded");
            AuthError::MalformedAuthorizationHeader(malformed::TOKEN_MALFORMED)
        })?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let kid = header
            .kid
            .as_deref()
            .filter(|kid| !kid.is_empty())
            .ok_or(AuthError::MissingKeyId)?;

        let key = self.keys.get_key(kid).await?;

        let data = decode::<TokenClaims>(token, key.decoding_key(), &self.validation)
            .map_err(|e| map_decode_error(e.kind()))?;
        let claims = data.claims;

        if claims.exp <= now.saturating_sub(self.leeway_secs) {
            return Err(AuthError::TokenExpired);
        }
        let expiry = DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::ClaimsInvalid)?;

        if claims.iss != self.issuer {
            debug!(iss = %claims.iss, "Token issuer does not match");
            return Err(AuthError::ClaimsInvalid);
        }
        if !claims.aud.iter().any(|aud| *aud == self.audience) {
            debug!(aud = ?claims.aud, "Token audience does not match");
            return Err(AuthError::ClaimsInvalid);
        }

        Ok(VerifiedClaims::new(
            claims.sub,
            claims.iss,
            self.audience.clone(),
            expiry,
            claims.permissions,
        ))
    }
}

fn map_decode_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::ImmatureSignature
        | ErrorKind::Json(_) => AuthError::ClaimsInvalid,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
            AuthError::MalformedAuthorizationHeader(malformed::TOKEN_MALFORMED)
        }
        other => {
            debug!(kind = ?other, "Token rejected by the signature backend");
            AuthError::SignatureInvalid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, CountingKeySource, PRIMARY, ROGUE, ROTATED};
    use jsonwebtoken::Header;
    use std::time::Duration;

    fn config() -> AuthConfig {
        AuthConfig::new("casting.test.auth0.com", testutil::AUDIENCE).unwrap()
    }

    fn verifier(source: &CountingKeySource) -> TokenVerifier<CountingKeySource> {
        let cache = Arc::new(SigningKeyCache::new(source.clone(), Duration::from_secs(1)));
        TokenVerifier::new(cache, &config())
    }

    fn primary_verifier() -> (CountingKeySource, TokenVerifier<CountingKeySource>) {
        let source = CountingKeySource::serving(&[testutil::PRIMARY_KID]);
        let verifier = verifier(&source);
        (source, verifier)
    }

    #[test]
    fn test_fixture_issuer_matches_config() {
        assert_eq!(config().issuer, testutil::ISSUER);
    }

    #[tokio::test]
    async fn test_valid_token() {
        let (_, verifier) = primary_verifier();
        let token = testutil::mint(&PRIMARY, &testutil::claims(&["get:movies"]));

        let claims = verifier.verify(&token).await.unwrap();
        assert_eq!(claims.subject, testutil::SUBJECT);
        assert_eq!(claims.issuer, testutil::ISSUER);
        assert_eq!(claims.audience, testutil::AUDIENCE);
        assert!(claims.has_permission("get:movies"));
    }

    #[tokio::test]
    async fn test_audience_array_containing_configured_audience() {
        let (_, verifier) = primary_verifier();
        let mut claims = testutil::claims(&[]);
        claims["aud"] = serde_json::json!([testutil::AUDIENCE, "https://casting.test.auth0.com/userinfo"]);
        let token = testutil::mint(&PRIMARY, &claims);

        let verified = verifier.verify(&token).await.unwrap();
        assert_eq!(verified.audience, testutil::AUDIENCE);
    }

    #[tokio::test]
    async fn test_verification_is_idempotent() {
        let (source, verifier) = primary_verifier();
        let token = testutil::mint(&PRIMARY, &testutil::claims(&["get:actors"]));

        let first = verifier.verify(&token).await.unwrap();
        let second = verifier.verify(&token).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_not_a_jwt() {
        let (source, verifier) = primary_verifier();
        for token in ["abc", "a.b", "not.a.jwt", ""] {
            let err = verifier.verify(token).await.unwrap_err();
            assert_eq!(
                err,
                AuthError::MalformedAuthorizationHeader(malformed::TOKEN_MALFORMED),
                "token {token:?}"
            );
        }
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test]
    async fn test_symmetric_algorithm_rejected_before_key_lookup() {
        let (source, verifier) = primary_verifier();
        let token = testutil::mint_hs256(testutil::PRIMARY_KID, &testutil::claims(&[]));

        let err = verifier.verify(&token).await.unwrap_err();
        assert_eq!(err, AuthError::UnsupportedAlgorithm("HS256".to_string()));
        assert_eq!(err.code(), "invalid_header");
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test]
    async fn test_other_rsa_algorithm_rejected() {
        let (_, verifier) = primary_verifier();
        let mut header = Header::new(Algorithm::RS512);
        header.kid = Some(testutil::PRIMARY_KID.to_string());
        let token = testutil::mint_with_header(&PRIMARY, header, &testutil::claims(&[]));

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::UnsupportedAlgorithm(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_kid() {
        let (_, verifier) = primary_verifier();
        let token = testutil::mint_with_header(
            &PRIMARY,
            Header::new(Algorithm::RS256),
            &testutil::claims(&[]),
        );

        let err = verifier.verify(&token).await.unwrap_err();
        assert_eq!(err, AuthError::MissingKeyId);
        assert_eq!(err.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn test_unknown_kid() {
        let (_, verifier) = primary_verifier();
        let token = testutil::mint(&ROGUE, &testutil::claims(&[]));

        assert_eq!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::UnknownSigningKey
        );
    }

    #[tokio::test]
    async fn test_signature_from_wrong_key() {
        let (_, verifier) = primary_verifier();
        // Signed by the rogue key but claiming the published kid.
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(testutil::PRIMARY_KID.to_string());
        let token = testutil::mint_with_header(&ROGUE, header, &testutil::claims(&[]));

        assert_eq!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn test_tampered_payload() {
        let (_, verifier) = primary_verifier();
        let token = testutil::mint(&PRIMARY, &testutil::claims(&["get:movies"]));
        let forged = testutil::mint(&PRIMARY, &testutil::claims(&["delete:movies"]));

        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = forged.split('.').nth(1).unwrap();
        let tampered = parts.join(".");

        assert_eq!(
            verifier.verify(&tampered).await.unwrap_err(),
            AuthError::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn test_wrong_issuer_and_audience() {
        let (_, verifier) = primary_verifier();

        let mut claims = testutil::claims(&[]);
        claims["iss"] = "https://someone-else.auth0.com/".into();
        let token = testutil::mint(&PRIMARY, &claims);
        assert_eq!(verifier.verify(&token).await.unwrap_err(), AuthError::ClaimsInvalid);

        let mut claims = testutil::claims(&[]);
        claims["aud"] = "another-api".into();
        let token = testutil::mint(&PRIMARY, &claims);
        assert_eq!(verifier.verify(&token).await.unwrap_err(), AuthError::ClaimsInvalid);
    }

    #[tokio::test]
    async fn test_missing_or_mistyped_claims() {
        let (_, verifier) = primary_verifier();

        for field in ["sub", "exp", "aud", "iss"] {
            let mut claims = testutil::claims(&[]);
            claims.as_object_mut().unwrap().remove(field);
            let token = testutil::mint(&PRIMARY, &claims);
            assert_eq!(
                verifier.verify(&token).await.unwrap_err(),
                AuthError::ClaimsInvalid,
                "without {field}"
            );
        }

        let mut claims = testutil::claims(&[]);
        claims["permissions"] = "get:movies".into();
        let token = testutil::mint(&PRIMARY, &claims);
        assert_eq!(verifier.verify(&token).await.unwrap_err(), AuthError::ClaimsInvalid);
    }

    #[tokio::test]
    async fn test_expiry_is_strict() {
        let (_, verifier) = primary_verifier();
        let now = testutil::now();

        let mut claims = testutil::claims(&[]);
        claims["exp"] = now.into();
        let token = testutil::mint(&PRIMARY, &claims);
        assert_eq!(
            verifier.verify_at(&token, now).await.unwrap_err(),
            AuthError::TokenExpired
        );

        claims["exp"] = (now + 1).into();
        let token = testutil::mint(&PRIMARY, &claims);
        assert!(verifier.verify_at(&token, now).await.is_ok());

        claims["exp"] = (now - 3600).into();
        let token = testutil::mint(&PRIMARY, &claims);
        let err = verifier.verify_at(&token, now).await.unwrap_err();
        assert_eq!(err, AuthError::TokenExpired);
        assert_eq!(err.code(), "token_expired");
    }

    #[tokio::test]
    async fn test_expiry_reported_before_issuer_and_audience() {
        let (_, verifier) = primary_verifier();
        let now = testutil::now();

        let mut claims = testutil::claims(&[]);
        claims["aud"] = "another-api".into();
        claims["exp"] = (now - 1).into();
        let token = testutil::mint(&PRIMARY, &claims);
        let err = verifier.verify_at(&token, now).await.unwrap_err();
        assert_eq!(err, AuthError::TokenExpired);
        assert_eq!(err.code(), "token_expired");

        let mut claims = testutil::claims(&[]);
        claims["iss"] = "https://someone-else.auth0.com/".into();
        claims["aud"] = "another-api".into();
        claims["exp"] = (now - 3600).into();
        let token = testutil::mint(&PRIMARY, &claims);
        assert_eq!(
            verifier.verify_at(&token, now).await.unwrap_err(),
            AuthError::TokenExpired
        );
    }

    #[tokio::test]
    async fn test_audience_array_without_configured_audience() {
        let (_, verifier) = primary_verifier();
        let mut claims = testutil::claims(&[]);
        claims["aud"] = serde_json::json!(["another-api", "https://casting.test.auth0.com/userinfo"]);
        let token = testutil::mint(&PRIMARY, &claims);

        assert_eq!(verifier.verify(&token).await.unwrap_err(), AuthError::ClaimsInvalid);
    }

    #[test]
    fn test_key_backend_errors_fail_closed() {
        assert_eq!(
            map_decode_error(&ErrorKind::InvalidKeyFormat),
            AuthError::SignatureInvalid
        );
        assert_eq!(
            map_decode_error(&ErrorKind::InvalidRsaKey("bad modulus".to_string())),
            AuthError::SignatureInvalid
        );
        assert_eq!(
            map_decode_error(&ErrorKind::InvalidSignature),
            AuthError::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn test_leeway_applies_to_expiry() {
        let source = CountingKeySource::serving(&[testutil::PRIMARY_KID]);
        let cache = Arc::new(SigningKeyCache::new(source, Duration::from_secs(1)));
        let mut config = config();
        config.leeway_secs = 30;
        let verifier = TokenVerifier::new(cache, &config);

        let now = testutil::now();
        let mut claims = testutil::claims(&[]);
        claims["exp"] = (now - 10).into();
        let token = testutil::mint(&PRIMARY, &claims);
        assert!(verifier.verify_at(&token, now).await.is_ok());

        claims["exp"] = (now - 30).into();
        let token = testutil::mint(&PRIMARY, &claims);
        assert_eq!(
            verifier.verify_at(&token, now).await.unwrap_err(),
            AuthError::TokenExpired
        );
    }

    #[tokio::test]
    async fn test_rotated_key_accepted_after_refresh() {
        let (source, verifier) = primary_verifier();
        let token = testutil::mint(&PRIMARY, &testutil::claims(&[]));
        verifier.verify(&token).await.unwrap();

        source.set_keys(&[testutil::PRIMARY_KID, testutil::ROTATED_KID]);
        let rotated = testutil::mint(&ROTATED, &testutil::claims(&["get:movies"]));
        let claims = verifier.verify(&rotated).await.unwrap();
        assert!(claims.has_permission("get:movies"));
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_key_set_outage_surfaces_as_server_error() {
        let source = CountingKeySource::default();
        source.fail_with("connection refused");
        let verifier = verifier(&source);
        let token = testutil::mint(&PRIMARY, &testutil::claims(&[]));

        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::KeySetFetchFailed(_)));
        assert_eq!(err.status().as_u16(), 500);
    }
}
