//! Password reset ticket stored as `"{user_id}:{code}"`.

use constant_time_eq::constant_time_eq;

/// Digits in a reset code
pub const RESET_CODE_LENGTH: usize = 6;

/// Pending password reset for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTicket {
    pub user_id: i64,
    pub code: String,
}

impl ResetTicket {
    pub fn new(user_id: i64, code: impl Into<String>) -> Self {
        Self {
            user_id,
            code: code.into(),
        }
    }

    /// Cache value representation
    pub fn to_cache_value(&self) -> String {
        format!("{}:{}", self.user_id, self.code)
    }

    /// Parse a cache value; `None` when it is not `user_id:code` with a positive id
    pub fn parse(value: &str) -> Option<Self> {
        let (user_id, code) = value.split_once(':')?;
        let user_id: i64 = user_id.parse().ok()?;
        if user_id <= 0 || code.is_empty() || code.contains(':') {
            return None;
        }
        Some(Self::new(user_id, code))
    }

    /// Compare the presented code in constant time
    pub fn matches_code(&self, presented: &str) -> bool {
        constant_time_eq(self.code.as_bytes(), presented.as_bytes())
    }
}
