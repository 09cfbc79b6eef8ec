//! Permission enforcement over verified claims.

use casting_core::AuthError;

use crate::claims::VerifiedClaims;

/// Checks that `claims` grants `required`.
///
/// An empty `required` skips the membership check, but the token must still
/// carry a `permissions` claim.
///
/// # Errors
///
/// - [`AuthError::PermissionsClaimMissing`] if the token has no `permissions` claim
/// - [`AuthError::PermissionDenied`] if `required` is not granted
pub fn require(claims: VerifiedClaims, required: &str) -> Result<VerifiedClaims, AuthError> {
    if !claims.has_permissions_claim() {
        return Err(AuthError::PermissionsClaimMissing);
    }
    if !required.is_empty() && !claims.has_permission(required) {
        return Err(AuthError::PermissionDenied);
    }
    Ok(claims)
}
