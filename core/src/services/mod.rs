//! Business services containing the session use cases.

pub mod password_reset;
pub mod session;

// Re-export commonly used types
pub use password_reset::PasswordResetService;
pub use session::{AuthTokenService, AuthTokenServiceConfig, RefreshCoordinator, SessionIssuer};
