//! Configuration for the session services

use std::time::Duration;

use sg_shared::config::SessionTokenConfig;

/// Lifetimes the token service applies outside the repository
#[derive(Debug, Clone)]
pub struct AuthTokenServiceConfig {
    /// Access token lifetime, reported to clients as `TokenPair::duration`
    pub access_token_ttl: Duration,
    /// Lifetime of the advisory refresh and issue locks
    pub refresh_lock_ttl: Duration,
}

impl Default for AuthTokenServiceConfig {
    fn default() -> Self {
        Self::from(&SessionTokenConfig::default())
    }
}

impl From<&SessionTokenConfig> for AuthTokenServiceConfig {
    fn from(config: &SessionTokenConfig) -> Self {
        Self {
            access_token_ttl: config.access_token_duration(),
            refresh_lock_ttl: config.refresh_lock_duration(),
        }
    }
}
