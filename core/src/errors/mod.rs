//! Domain-specific error types and error handling.

mod types;

pub use types::{AuthError, CacheError, TokenError};

use thiserror::Error;

/// Core domain errors
///
/// A closed set so callers can branch on the kind instead of matching text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Cache unavailable during {operation}: {message}")]
    CacheUnavailable { operation: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<CacheError> for DomainError {
    fn from(err: CacheError) -> Self {
        DomainError::CacheUnavailable {
            operation: err.operation,
            message: err.message,
        }
    }
}

/// How a caller should react to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Re-authentication required
    InvalidCredential,
    /// Retry once after a short backoff
    RateLimited,
    /// The account may not obtain a session
    Forbidden,
    /// Server-side failure; never treat as success
    Server,
}

impl DomainError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DomainError::Token(_) => ErrorCategory::InvalidCredential,
            DomainError::Auth(AuthError::InvalidToken) => ErrorCategory::InvalidCredential,
            DomainError::Auth(AuthError::ConcurrentRefreshInProgress)
            | DomainError::Auth(AuthError::SessionBusy) => ErrorCategory::RateLimited,
            DomainError::Auth(AuthError::UserInvalid) => ErrorCategory::Forbidden,
            DomainError::Auth(AuthError::InvalidResetTicket) => ErrorCategory::Forbidden,
            DomainError::CacheUnavailable { .. }
            | DomainError::Config { .. }
            | DomainError::Internal { .. } => ErrorCategory::Server,
        }
    }

    /// HTTP status the presentation layer should answer with
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::InvalidCredential => 401,
            ErrorCategory::RateLimited => 429,
            ErrorCategory::Forbidden => 400,
            ErrorCategory::Server => 500,
        }
    }

    /// Stable machine-readable code; token sub-cases collapse into one code
    pub fn error_code(&self) -> &'static str {
        match self {
            DomainError::Token(_) | DomainError::Auth(AuthError::InvalidToken) => "INVALID_TOKEN",
            DomainError::Auth(AuthError::ConcurrentRefreshInProgress)
            | DomainError::Auth(AuthError::SessionBusy) => "TOO_MANY_REQUESTS",
            DomainError::Auth(AuthError::UserInvalid) => "USER_INVALID",
            DomainError::Auth(AuthError::InvalidResetTicket) => "INVALID_RESET_TICKET",
            DomainError::CacheUnavailable { .. } => "CACHE_UNAVAILABLE",
            DomainError::Config { .. } => "CONFIG_ERROR",
            DomainError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::RateLimited)
    }
}
