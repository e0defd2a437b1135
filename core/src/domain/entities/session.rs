//! Session record bound to one (user, platform) slot.

use serde::{Deserialize, Serialize};

/// The unit stored under the access token, the refresh token and the user's
/// platform hash field
///
/// Exactly one live record exists per (user, platform). Login and refresh
/// replace it; `session_id` survives refreshes so state keyed by it stays
/// valid until the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Owner of the session
    pub user_id: i64,

    /// Client surface (e.g. "APP", "H5", "WX")
    pub platform: String,

    /// Stable across refreshes, regenerated on login
    pub session_id: String,

    /// Currently valid access token
    pub access_token: String,

    /// Currently valid refresh token
    pub refresh_token: String,
}

impl SessionRecord {
    pub fn new(
        user_id: i64,
        platform: impl Into<String>,
        session_id: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            platform: platform.into(),
            session_id: session_id.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Whether `refresh_token` is the one this record currently holds
    pub fn holds_refresh_token(&self, refresh_token: &str) -> bool {
        self.refresh_token == refresh_token
    }
}
