//! Implementations of the `keys` and `verify` subcommands.

use serde_json::{Value, json};

use casting_auth::{AuthPipeline, KeySetSnapshot, KeySetSource, SigningKeyCache};
use casting_core::{AuthError, ErrorBody};

/// One admitted key, as printed by `keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLine {
    pub kid: String,
    pub alg: String,
}

impl std::fmt::Display for KeyLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}", self.kid, self.alg)
    }
}

/// Admitted keys of `snapshot`, sorted by kid.
pub fn describe_keys(snapshot: &KeySetSnapshot) -> Vec<KeyLine> {
    snapshot
        .key_ids()
        .into_iter()
        .filter_map(|kid| snapshot.get(kid))
        .map(|key| KeyLine {
            kid: key.key_id.clone(),
            alg: format!("{:?}", key.algorithm),
        })
        .collect()
}

/// Fetches the key set through `cache` and lists the admitted keys.
pub async fn keys<S: KeySetSource>(cache: &SigningKeyCache<S>) -> Result<Vec<KeyLine>, AuthError> {
    let snapshot = cache.refresh().await?;
    Ok(describe_keys(&snapshot))
}

/// Result of `verify`: what to print and whether the token was accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyOutcome {
    pub accepted: bool,
    pub body: Value,
}

/// Runs `token` through the full pipeline for `permission`.
///
/// On success the body is the verified claims; on failure it is the same JSON
/// body the API would have responded with.
pub async fn verify<S: KeySetSource>(
    pipeline: &AuthPipeline<S>,
    token: &str,
    permission: &str,
) -> VerifyOutcome {
    let header = format!("Bearer {token}");
    match pipeline.authorize(Some(header.as_bytes()), permission).await {
        Ok(claims) => VerifyOutcome {
            accepted: true,
            body: serde_json::to_value(&claims).unwrap_or_else(|e| json!({ "error": e.to_string() })),
        },
        Err(err) => VerifyOutcome {
            accepted: false,
            body: json!(ErrorBody::from(&err)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casting_auth::testutil::{self, CountingKeySource, PRIMARY, ROGUE};
    use casting_config::AuthConfig;
    use casting_core::permissions;
    use std::time::Duration;

    fn config() -> AuthConfig {
        AuthConfig::new("casting.test.auth0.com", testutil::AUDIENCE).unwrap()
    }

    #[tokio::test]
    async fn test_keys_lists_admitted_keys_sorted() {
        let source =
            CountingKeySource::serving(&[testutil::ROTATED_KID, testutil::PRIMARY_KID]);
        let cache = SigningKeyCache::new(source, Duration::from_secs(1));

        let lines = keys(&cache).await.unwrap();
        let kids: Vec<&str> = lines.iter().map(|l| l.kid.as_str()).collect();
        let mut expected = vec![testutil::PRIMARY_KID, testutil::ROTATED_KID];
        expected.sort_unstable();

        assert_eq!(kids, expected);
        assert!(lines.iter().all(|l| l.alg == "RS256"));
        assert_eq!(lines[0].to_string(), format!("{}\tRS256", lines[0].kid));
    }

    #[tokio::test]
    async fn test_keys_propagates_fetch_failure() {
        let source = CountingKeySource::default();
        source.fail_with("dns failure");
        let cache = SigningKeyCache::new(source, Duration::from_secs(1));

        assert!(matches!(
            keys(&cache).await,
            Err(AuthError::KeySetFetchFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_accepts_valid_token() {
        let source = CountingKeySource::serving(&[testutil::PRIMARY_KID]);
        let pipeline = AuthPipeline::with_source(source, &config());
        let token = testutil::mint(&PRIMARY, &testutil::claims(&[permissions::PATCH_MOVIES]));

        let outcome = verify(&pipeline, &token, permissions::PATCH_MOVIES).await;
        assert!(outcome.accepted);
        assert_eq!(outcome.body["subject"], testutil::SUBJECT);
        assert_eq!(outcome.body["permissions"], json!([permissions::PATCH_MOVIES]));
    }

    #[tokio::test]
    async fn test_verify_renders_error_body() {
        let source = CountingKeySource::serving(&[testutil::PRIMARY_KID]);
        let pipeline = AuthPipeline::with_source(source, &config());
        let token = testutil::mint(&ROGUE, &testutil::claims(&[]));

        let outcome = verify(&pipeline, &token, permissions::AUTHENTICATED).await;
        assert!(!outcome.accepted);
        assert_eq!(
            outcome.body,
            json!({
                "success": false,
                "error": 401,
                "message": {
                    "code": "invalid_header",
                    "description": "Unable to find the appropriate key."
                }
            })
        );
    }
}
