//! Session token configuration
//!
//! The defaults below are a compatibility contract with already-issued
//! tokens and with clients that schedule refreshes around them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Access token lifetime (2 hours)
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 2 * 60 * 60;

/// Refresh token lifetime (10 days)
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 10 * 24 * 60 * 60;

/// How long a rotated-away refresh token keeps resolving (6 hours)
pub const DEFAULT_REFRESH_GRACE_SECS: u64 = 6 * 60 * 60;

/// Lifetime of the advisory refresh lock
pub const DEFAULT_REFRESH_LOCK_TTL_SECS: u64 = 10;

/// Lifetime of a password reset ticket (15 minutes)
pub const DEFAULT_PASSWORD_RESET_TTL_SECS: u64 = 15 * 60;

/// Required length of the token cipher key in bytes
pub const TOKEN_KEY_LENGTH: usize = 16;

const DEFAULT_TOKEN_KEY: &str = "fc49607d05e1a1ba";

/// Token lifetimes and the symmetric token key
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionTokenConfig {
    /// Access token TTL in seconds
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl: u64,

    /// Refresh token TTL in seconds
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl: u64,

    /// Grace window for rotated refresh tokens in seconds
    #[serde(default = "default_refresh_grace")]
    pub refresh_grace: u64,

    /// Refresh lock TTL in seconds
    #[serde(default = "default_lock_ttl")]
    pub refresh_lock_ttl: u64,

    /// Password reset ticket TTL in seconds
    #[serde(default = "default_reset_ttl")]
    pub password_reset_ttl: u64,

    /// 16-byte AES key shared by every node that issues or decodes tokens
    #[serde(default = "default_token_key")]
    pub token_key: String,
}

impl Default for SessionTokenConfig {
    fn default() -> Self {
        Self {
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            refresh_grace: DEFAULT_REFRESH_GRACE_SECS,
            refresh_lock_ttl: DEFAULT_REFRESH_LOCK_TTL_SECS,
            password_reset_ttl: DEFAULT_PASSWORD_RESET_TTL_SECS,
            token_key: default_token_key(),
        }
    }
}

impl SessionTokenConfig {
    /// Create from environment variables, falling back to the defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            access_token_ttl: env_secs("SESSION_ACCESS_TOKEN_TTL_SECS", defaults.access_token_ttl),
            refresh_token_ttl: env_secs("SESSION_REFRESH_TOKEN_TTL_SECS", defaults.refresh_token_ttl),
            refresh_grace: env_secs("SESSION_REFRESH_GRACE_SECS", defaults.refresh_grace),
            refresh_lock_ttl: env_secs("SESSION_REFRESH_LOCK_TTL_SECS", defaults.refresh_lock_ttl),
            password_reset_ttl: env_secs("SESSION_PASSWORD_RESET_TTL_SECS", defaults.password_reset_ttl),
            token_key: std::env::var("SESSION_TOKEN_KEY").unwrap_or(defaults.token_key),
        }
    }

    /// Replace the token key
    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// Check that every duration is positive and the key has the right length
    pub fn validate(&self) -> Result<(), String> {
        if self.token_key.len() != TOKEN_KEY_LENGTH {
            return Err(format!(
                "token key must be {} bytes, got {}",
                TOKEN_KEY_LENGTH,
                self.token_key.len()
            ));
        }
        let durations = [
            ("access_token_ttl", self.access_token_ttl),
            ("refresh_token_ttl", self.refresh_token_ttl),
            ("refresh_grace", self.refresh_grace),
            ("refresh_lock_ttl", self.refresh_lock_ttl),
            ("password_reset_ttl", self.password_reset_ttl),
        ];
        for (name, secs) in durations {
            if secs == 0 {
                return Err(format!("{} must be greater than zero", name));
            }
        }
        Ok(())
    }

    pub fn access_token_duration(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl)
    }

    pub fn refresh_token_duration(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl)
    }

    pub fn refresh_grace_duration(&self) -> Duration {
        Duration::from_secs(self.refresh_grace)
    }

    pub fn refresh_lock_duration(&self) -> Duration {
        Duration::from_secs(self.refresh_lock_ttl)
    }

    pub fn password_reset_duration(&self) -> Duration {
        Duration::from_secs(self.password_reset_ttl)
    }

    /// Whether the built-in development key is still in use
    pub fn is_using_default_key(&self) -> bool {
        self.token_key == DEFAULT_TOKEN_KEY
    }
}

fn env_secs(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn default_access_ttl() -> u64 {
    DEFAULT_ACCESS_TOKEN_TTL_SECS
}

fn default_refresh_ttl() -> u64 {
    DEFAULT_REFRESH_TOKEN_TTL_SECS
}

fn default_refresh_grace() -> u64 {
    DEFAULT_REFRESH_GRACE_SECS
}

fn default_lock_ttl() -> u64 {
    DEFAULT_REFRESH_LOCK_TTL_SECS
}

fn default_reset_ttl() -> u64 {
    DEFAULT_PASSWORD_RESET_TTL_SECS
}

fn default_token_key() -> String {
    DEFAULT_TOKEN_KEY.to_string()
}
