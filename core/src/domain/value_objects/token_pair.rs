//! Credential pair handed to the client after login or refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issued access/refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token validity in seconds
    pub duration: i64,
    /// Server time at issuance
    pub issued_at: DateTime<Utc>,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String, duration: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            duration,
            issued_at: Utc::now(),
        }
    }
}
