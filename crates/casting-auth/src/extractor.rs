//! Bearer token extraction from the `Authorization` header.

use casting_core::AuthError;
use casting_core::errors::malformed;

/// Pulls the token out of a raw `Authorization` header value.
///
/// The header must be exactly two parts separated by a single space: the
/// `Bearer` scheme (case-insensitive) and a non-empty token. Header bytes that
/// are not valid UTF-8 are treated as malformed.
///
/// # Errors
///
/// - [`AuthError::AuthorizationHeaderMissing`] when `raw` is `None`
/// - [`AuthError::MalformedAuthorizationHeader`] for any other shape
pub fn extract_bearer(raw: Option<&[u8]>) -> Result<&str, AuthError> {
    let raw = raw.ok_or(AuthError::AuthorizationHeaderMissing)?;
    let header = std::str::from_utf8(raw)
        .map_err(|_| AuthError::MalformedAuthorizationHeader(malformed::SCHEME))?;

    let parts: Vec<&str> = header.split(' ').collect();
    let scheme = parts[0];
    if scheme.is_empty() || !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedAuthorizationHeader(malformed::SCHEME));
    }

    match parts.as_slice() {
        [_, token] if !token.is_empty() => Ok(*token),
        [_] | [_, _] => Err(AuthError::MalformedAuthorizationHeader(
            malformed::TOKEN_NOT_FOUND,
        )),
        _ => Err(AuthError::MalformedAuthorizationHeader(
            malformed::NOT_BEARER_TOKEN,
        )),
    }
}
