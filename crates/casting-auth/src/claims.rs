//! Claim structures for identity-provider access tokens.
//!
//! - [`TokenClaims`]: the payload as it is decoded from the token, before any
//!   interpretation beyond JSON typing
//! - [`VerifiedClaims`]: the typed identity handed to route handlers once
//!   signature and standard claims have been checked
//!
//! A [`VerifiedClaims`] value only exists after a successful verification and
//! is rebuilt for every request; nothing here is cached.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Raw access token payload.
///
/// `aud` may be a single string or an array; `permissions` is `None` when the
/// claim is absent (or `null`), which the enforcer treats differently from an
/// empty list.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Subject (user id at the identity provider)
    pub sub: String,
    /// Issuer URL
    pub iss: String,
    /// Audiences the token was issued for
    #[serde(deserialize_with = "one_or_many")]
    pub aud: Vec<String>,
    /// Expiration time (seconds since the Unix epoch)
    pub exp: i64,
    /// Permission names granted through the user's roles
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(aud) => vec![aud],
        OneOrMany::Many(auds) => auds,
    })
}

static NO_PERMISSIONS: BTreeSet<String> = BTreeSet::new();

/// Identity of a caller whose token passed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedClaims {
    /// Subject (user id at the identity provider)
    pub subject: String,
    /// Issuer, equal to the configured issuer
    pub issuer: String,
    /// Audience, equal to the configured API audience
    pub audience: String,
    /// Expiration time, strictly in the future at verification time
    pub expiry: DateTime<Utc>,
    #[serde(rename = "permissions", serialize_with = "serialize_permissions")]
    permissions: Option<BTreeSet<String>>,
}

fn serialize_permissions<S>(
    permissions: &Option<BTreeSet<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    permissions
        .as_ref()
        .unwrap_or(&NO_PERMISSIONS)
        .serialize(serializer)
}

impl VerifiedClaims {
    /// Builds claims from already-validated parts. `permissions` is `None`
    /// when the token carried no permissions claim; duplicates collapse.
    pub fn new<I>(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        expiry: DateTime<Utc>,
        permissions: Option<I>,
    ) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            subject: subject.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            expiry,
            permissions: permissions.map(|p| p.into_iter().collect()),
        }
    }

    /// Granted permissions; empty when the claim was absent.
    pub fn permissions(&self) -> &BTreeSet<String> {
        self.permissions.as_ref().unwrap_or(&NO_PERMISSIONS)
    }

    /// Whether the token carried a `permissions` claim at all.
    pub fn has_permissions_claim(&self) -> bool {
        self.permissions.is_some()
    }

    /// Check if the caller has a specific permission
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions().contains(permission)
    }

    /// Check if the caller has any of the specified permissions
    pub fn has_any_permission(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.has_permission(p))
    }
}
