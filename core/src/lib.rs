//! # SessionGate Core
//!
//! Session backbone for the SessionGate backend: the token codec, session
//! storage over an abstract cache, refresh coordination and the services
//! outer layers call to issue, verify and revoke credentials.

pub mod codec;
pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use codec::TokenCodec;
pub use domain::{ResetTicket, SessionRecord, TokenPair, TokenVerification, UserIdentity};
pub use errors::{
    AuthError, CacheError, DomainError, DomainResult, ErrorCategory, TokenError,
};
pub use repositories::{
    CacheStore, IdentityDirectory, SessionKeys, SessionRepository, SessionTtl,
};
pub use services::{
    AuthTokenService, AuthTokenServiceConfig, PasswordResetService, RefreshCoordinator,
    SessionIssuer,
};
