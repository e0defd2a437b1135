//! Session lifecycle: login issuance, refresh rotation, verification and revocation
//!
//! - `AuthTokenService` - the only component called by outer layers
//! - `RefreshCoordinator` - lock and stale-token check wrapped around refresh

mod config;
mod coordinator;
mod service;

#[cfg(test)]
mod tests;

pub use config::AuthTokenServiceConfig;
pub use coordinator::{RefreshCoordinator, SessionIssuer};
pub use service::AuthTokenService;
