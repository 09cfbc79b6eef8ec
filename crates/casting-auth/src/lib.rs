//! # Casting Auth
//!
//! Bearer-token verification and permission enforcement for the Casting Agency API.
//!
//! Every protected request goes through the same stages, and the first failing
//! stage decides the error:
//!
//! - [`extractor`]: pull the token out of `Authorization: Bearer <token>`
//! - [`verifier`]: check algorithm, key id, signature, issuer, audience and expiry
//! - [`jwks`]: resolve the key id against the cached identity-provider key set
//! - [`enforcer`]: require a permission from the token's `permissions` claim
//!
//! [`AuthPipeline`] composes the stages. Errors are [`casting_core::AuthError`]
//! values and render through the error boundary in `casting-core`.
//!
//! # Example
//!
//! ```ignore
//! use casting_auth::AuthPipeline;
//! use casting_config::AuthConfig;
//! use casting_core::permissions;
//!
//! let config = AuthConfig::from_env()?;
//! let pipeline = AuthPipeline::from_config(&config)?;
//!
//! let claims = pipeline
//!     .authorize(Some(b"Bearer eyJhbGciOi..."), permissions::GET_MOVIES)
//!     .await?;
//! println!("caller: {}", claims.subject);
//! ```

pub mod claims;
pub mod enforcer;
pub mod extractor;
pub mod jwks;
pub mod pipeline;
pub mod verifier;

#[cfg(any(test, feature = "test-utils"))]
pub mod testutil;

// Re-export commonly used types at crate root
pub use claims::{TokenClaims, VerifiedClaims};
pub use enforcer::require;
pub use extractor::extract_bearer;
pub use jwks::{HttpKeySetSource, Jwk, JwkSet, KeySetSnapshot, KeySetSource, SigningKey, SigningKeyCache};
pub use pipeline::AuthPipeline;
pub use verifier::TokenVerifier;
