//! Session storage indexed by access token, refresh token and (user, platform).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sg_shared::config::SessionTokenConfig;
use sg_shared::mask_token;
use tracing::{debug, error, warn};

use crate::domain::entities::SessionRecord;
use crate::errors::{CacheError, DomainError, DomainResult};
use crate::repositories::cache::CacheStore;

use super::keys::SessionKeys;

const LOCK_MARKER: &str = "1";

/// Lifetimes applied by the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTtl {
    pub access: Duration,
    pub refresh: Duration,
    /// How long a rotated-away refresh token keeps resolving
    pub grace: Duration,
}

impl From<&SessionTokenConfig> for SessionTtl {
    fn from(config: &SessionTokenConfig) -> Self {
        Self {
            access: config.access_token_duration(),
            refresh: config.refresh_token_duration(),
            grace: config.refresh_grace_duration(),
        }
    }
}

impl Default for SessionTtl {
    fn default() -> Self {
        Self::from(&SessionTokenConfig::default())
    }
}

/// TTL-bound session storage over a [`CacheStore`]
///
/// One logical session lives under three keys. Writes are sequential and not
/// atomic as a group; readers must tolerate a record that is present under
/// one key and missing under another.
pub struct SessionRepository {
    cache: Arc<dyn CacheStore>,
    keys: SessionKeys,
    ttl: SessionTtl,
}

impl SessionRepository {
    pub fn new(cache: Arc<dyn CacheStore>, keys: SessionKeys, ttl: SessionTtl) -> Self {
        Self { cache, keys, ttl }
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    /// Remaining life given to a rotated-away refresh token
    pub fn grace(&self) -> Duration {
        self.ttl.grace
    }

    /// Store a session under its access token, refresh token and platform slot
    ///
    /// The writes happen in that order. A failure stops the sequence and is
    /// returned; keys written before it are left to expire on their TTL.
    pub async fn put_session(&self, session: &SessionRecord) -> DomainResult<()> {
        let payload = serde_json::to_string(session).map_err(|e| DomainError::Internal {
            message: format!("failed to serialize session: {}", e),
        })?;

        self.cache
            .set_with_expiry(&self.keys.access(&session.access_token), &payload, self.ttl.access)
            .await
            .map_err(|e| write_failed(session, "access", &[], e))?;
        self.cache
            .set_with_expiry(&self.keys.refresh(&session.refresh_token), &payload, self.ttl.refresh)
            .await
            .map_err(|e| write_failed(session, "refresh", &["access"], e))?;
        self.cache
            .hset(&self.keys.user(session.user_id), &session.platform, &payload)
            .await
            .map_err(|e| write_failed(session, "platform", &["access", "refresh"], e))?;

        debug!(
            user_id = session.user_id,
            platform = %session.platform,
            session_id = %session.session_id,
            "Session stored"
        );
        Ok(())
    }

    /// Resolve the session an access token belongs to
    pub async fn get_by_access_token(&self, token: &str) -> DomainResult<Option<SessionRecord>> {
        let raw = self
            .cache
            .get(&self.keys.access(token))
            .await
            .map_err(|e| cache_failure("get_by_access_token", e))?;
        decode_optional("get_by_access_token", raw)
    }

    /// Resolve the session a refresh token belongs to
    ///
    /// A rotated-away token still resolves during the grace window; callers
    /// must compare it with the current platform session.
    pub async fn get_by_refresh_token(&self, token: &str) -> DomainResult<Option<SessionRecord>> {
        let raw = self
            .cache
            .get(&self.keys.refresh(token))
            .await
            .map_err(|e| cache_failure("get_by_refresh_token", e))?;
        decode_optional("get_by_refresh_token", raw)
    }

    /// Current session of a user on one platform
    pub async fn get_platform_session(
        &self,
        user_id: i64,
        platform: &str,
    ) -> DomainResult<Option<SessionRecord>> {
        let raw = self
            .cache
            .hget(&self.keys.user(user_id), platform)
            .await
            .map_err(|e| cache_failure("get_platform_session", e))?;
        decode_optional("get_platform_session", raw)
    }

    /// Every live session of a user keyed by platform
    pub async fn get_all_sessions(&self, user_id: i64) -> DomainResult<HashMap<String, SessionRecord>> {
        let raw = self
            .cache
            .hget_all(&self.keys.user(user_id))
            .await
            .map_err(|e| cache_failure("get_all_sessions", e))?;

        raw.into_iter()
            .map(|(platform, json)| Ok((platform, decode("get_all_sessions", &json)?)))
            .collect()
    }

    pub async fn revoke_access_token(&self, token: &str) -> DomainResult<()> {
        self.cache
            .delete(&self.keys.access(token))
            .await
            .map_err(|e| cache_failure("revoke_access_token", e))?;
        Ok(())
    }

    pub async fn revoke_refresh_token(&self, token: &str) -> DomainResult<()> {
        self.cache
            .delete(&self.keys.refresh(token))
            .await
            .map_err(|e| cache_failure("revoke_refresh_token", e))?;
        Ok(())
    }

    /// Shorten a refresh token's remaining life to `grace`
    ///
    /// The token keeps resolving so that a late replay is recognised and
    /// logged instead of looking like an unknown token. A token that already
    /// expires sooner keeps its own deadline.
    pub async fn expire_refresh_token_soon(&self, token: &str, grace: Duration) -> DomainResult<()> {
        self.cache
            .expire(&self.keys.refresh(token), grace)
            .await
            .map_err(|e| cache_failure("expire_refresh_token_soon", e))?;
        Ok(())
    }

    /// Drop the platform slot of a user
    pub async fn remove_platform_session(&self, user_id: i64, platform: &str) -> DomainResult<()> {
        self.cache
            .hdel(&self.keys.user(user_id), platform)
            .await
            .map_err(|e| cache_failure("remove_platform_session", e))?;
        Ok(())
    }

    /// Invalidate every session of a user
    ///
    /// Each platform's access token is deleted and its refresh token capped
    /// at the grace window, then the per-user hash is dropped. Failures do
    /// not stop the sweep; the first one is returned once it finishes.
    pub async fn revoke_all_sessions(&self, user_id: i64) -> DomainResult<()> {
        let sessions = self.get_all_sessions(user_id).await?;
        let mut first_failure: Option<CacheError> = None;

        for (platform, session) in &sessions {
            if let Err(e) = self
                .cache
                .expire(&self.keys.refresh(&session.refresh_token), self.ttl.grace)
                .await
            {
                error!(user_id, platform = %platform, error = %e, "Failed to expire refresh token");
                first_failure.get_or_insert(e);
            }
            if let Err(e) = self.cache.delete(&self.keys.access(&session.access_token)).await {
                error!(user_id, platform = %platform, error = %e, "Failed to revoke access token");
                first_failure.get_or_insert(e);
            }
        }

        if let Err(e) = self.cache.delete(&self.keys.user(user_id)).await {
            error!(user_id, error = %e, "Failed to drop user session index");
            first_failure.get_or_insert(e);
        }

        match first_failure {
            Some(e) => Err(e.within("revoke_all_sessions").into()),
            None => {
                debug!(user_id, platforms = sessions.len(), "All sessions revoked");
                Ok(())
            }
        }
    }

    /// Take the advisory refresh lock for a presented refresh token
    ///
    /// # Returns
    /// * `Ok(true)` - Lock acquired
    /// * `Ok(false)` - Another refresh holds it
    pub async fn try_lock_refresh(&self, token: &str, ttl: Duration) -> DomainResult<bool> {
        let acquired = self
            .cache
            .set_nx_with_expiry(&self.keys.refresh_lock(token), LOCK_MARKER, ttl)
            .await
            .map_err(|e| cache_failure("try_lock_refresh", e))?;
        debug!(token = %mask_token(token), acquired, "Refresh lock attempt");
        Ok(acquired)
    }

    pub async fn unlock_refresh(&self, token: &str) -> DomainResult<()> {
        self.cache
            .delete(&self.keys.refresh_lock(token))
            .await
            .map_err(|e| cache_failure("unlock_refresh", e))?;
        Ok(())
    }

    /// Take the lock that serializes issuance into one (user, platform) slot
    pub async fn try_lock_issue(&self, user_id: i64, platform: &str, ttl: Duration) -> DomainResult<bool> {
        let acquired = self
            .cache
            .set_nx_with_expiry(&self.keys.issue_lock(user_id, platform), LOCK_MARKER, ttl)
            .await
            .map_err(|e| cache_failure("try_lock_issue", e))?;
        debug!(user_id, platform, acquired, "Issue lock attempt");
        Ok(acquired)
    }

    pub async fn unlock_issue(&self, user_id: i64, platform: &str) -> DomainResult<()> {
        self.cache
            .delete(&self.keys.issue_lock(user_id, platform))
            .await
            .map_err(|e| cache_failure("unlock_issue", e))?;
        Ok(())
    }
}

fn write_failed(
    session: &SessionRecord,
    step: &'static str,
    completed: &[&str],
    err: CacheError,
) -> DomainError {
    if completed.is_empty() {
        error!(
            user_id = session.user_id,
            platform = %session.platform,
            step,
            error = %err,
            "Failed to store session"
        );
    } else {
        warn!(
            user_id = session.user_id,
            platform = %session.platform,
            step,
            completed = ?completed,
            error = %err,
            "Session stored partially"
        );
    }
    err.within("put_session").into()
}

fn cache_failure(step: &str, err: CacheError) -> DomainError {
    error!(step, error = %err, "Session cache operation failed");
    err.within(step).into()
}

fn decode(operation: &str, json: &str) -> DomainResult<SessionRecord> {
    serde_json::from_str(json).map_err(|e| DomainError::Internal {
        message: format!("corrupt session record in {}: {}", operation, e),
    })
}

fn decode_optional(operation: &str, raw: Option<String>) -> DomainResult<Option<SessionRecord>> {
    raw.map(|json| decode(operation, &json)).transpose()
}
