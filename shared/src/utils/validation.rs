//! Shape checks for values that arrive from request headers

use once_cell::sync::Lazy;
use regex::Regex;

/// Length of every access and refresh token in characters
pub const TOKEN_LENGTH: usize = 40;

static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-f]{40}$").unwrap());

/// Whether `value` looks like an issued token (40 lowercase hex characters).
///
/// Shape only; says nothing about whether the token is live.
pub fn is_token_shaped(value: &str) -> bool {
    TOKEN_REGEX.is_match(value)
}
