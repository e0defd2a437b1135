//! Cache key layout for session state.

/// Builds every cache key the session subsystem touches
///
/// ```text
/// session:access:{token}          JSON SessionRecord, access TTL
/// session:refresh:{token}         JSON SessionRecord, refresh TTL
/// session:user:{user_id}          hash platform -> JSON SessionRecord
/// session:refresh-lock:{token}    lock marker, lock TTL
/// session:issue-lock:{uid}:{plat} lock marker, lock TTL
/// session:password-reset:{token}  "{user_id}:{code}", reset TTL
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionKeys {
    prefix: Option<String>,
}

impl SessionKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespace every key under `prefix:`; an empty prefix is ignored
    pub fn with_prefix(prefix: Option<&str>) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
        }
    }

    pub fn access(&self, token: &str) -> String {
        self.make("access", token)
    }

    pub fn refresh(&self, token: &str) -> String {
        self.make("refresh", token)
    }

    pub fn user(&self, user_id: i64) -> String {
        self.make("user", &user_id.to_string())
    }

    pub fn refresh_lock(&self, token: &str) -> String {
        self.make("refresh-lock", token)
    }

    /// Guards read-old/write-new/revoke-old of one platform slot
    pub fn issue_lock(&self, user_id: i64, platform: &str) -> String {
        self.make("issue-lock", &format!("{}:{}", user_id, platform))
    }

    pub fn password_reset(&self, token: &str) -> String {
        self.make("password-reset", token)
    }

    fn make(&self, namespace: &str, id: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:session:{}:{}", prefix, namespace, id),
            None => format!("session:{}:{}", namespace, id),
        }
    }
}
