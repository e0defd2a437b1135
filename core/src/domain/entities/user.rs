//! What the identity directory tells us about a user.

use serde::{Deserialize, Serialize};

/// Identity facts consulted before a session is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: i64,
    /// Blocked users may not obtain new sessions
    pub blocked: bool,
}

impl UserIdentity {
    pub fn active(user_id: i64) -> Self {
        Self { user_id, blocked: false }
    }

    pub fn blocked(user_id: i64) -> Self {
        Self { user_id, blocked: true }
    }

    /// Whether the user may log in
    pub fn may_login(&self) -> bool {
        self.user_id > 0 && !self.blocked
    }
}
