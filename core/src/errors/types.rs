//! Error kinds for token decoding, session authentication and cache access
//!
//! The HTTP layer maps these to responses through
//! [`DomainError::category`](super::DomainError::category); messages carry
//! both English and Chinese text the same way the rest of the backend does.

use thiserror::Error;

/// Failures of the token codec
///
/// Always caused by the client. Callers must report every variant as the same
/// generic invalid-token outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Wrong length or not hex
    #[error("Malformed token")]
    Format,

    /// Ciphertext did not decrypt to a padded payload
    #[error("Undecryptable token")]
    Crypto,

    /// Decrypted payload carries user id 0
    #[error("Token carries no user")]
    Value,
}

/// Authentication outcomes surfaced to callers of the session services
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Token unknown, expired, rotated away or replayed
    #[error("Invalid token, please login again | Token无效，请重新登录")]
    InvalidToken,

    /// Another refresh holds the lock for the same refresh token
    #[error("Token refresh already in progress, retry shortly | 请求过多，请稍后重试")]
    ConcurrentRefreshInProgress,

    /// Another login or refresh is replacing the same platform session
    #[error("Session is being updated, retry shortly | 请求过多，请稍后重试")]
    SessionBusy,

    /// User is missing or blocked
    #[error("User account is invalid or blocked | 用户异常")]
    UserInvalid,

    /// Password reset ticket unknown, expired or the code does not match
    #[error("Invalid password reset request | 密码重置参数错误")]
    InvalidResetTicket,
}

/// A cache primitive failed (transport, timeout or backend error)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cache operation '{operation}' failed: {message}")]
pub struct CacheError {
    /// Name of the primitive or repository step that failed
    pub operation: String,
    /// Backend error text
    pub message: String,
}

impl CacheError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Prefix the operation with the repository step that issued it
    pub fn within(self, step: &str) -> Self {
        Self {
            operation: format!("{}/{}", step, self.operation),
            message: self.message,
        }
    }
}
