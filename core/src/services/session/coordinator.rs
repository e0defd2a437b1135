//! Mutual exclusion and stale-token detection around refresh

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sg_shared::mask_token;
use tracing::{info, warn};

use crate::domain::value_objects::TokenPair;
use crate::errors::{AuthError, DomainResult};
use crate::repositories::SessionRepository;

/// Mints a replacement pair for an existing session
#[async_trait]
pub trait SessionIssuer: Send + Sync {
    /// Issue a new pair for (user, platform) keeping `session_id`
    async fn reissue(&self, user_id: i64, platform: &str, session_id: &str)
        -> DomainResult<TokenPair>;
}

/// Serializes refreshes of one refresh token and rejects stale ones
///
/// The lock is keyed by the presented token, so two clients racing with the
/// same token contend while unrelated refreshes do not.
pub struct RefreshCoordinator {
    repository: Arc<SessionRepository>,
    lock_ttl: Duration,
}

impl RefreshCoordinator {
    pub fn new(repository: Arc<SessionRepository>, lock_ttl: Duration) -> Self {
        Self {
            repository,
            lock_ttl,
        }
    }

    /// Exchange a refresh token for a new pair
    ///
    /// # Errors
    ///
    /// * `AuthError::ConcurrentRefreshInProgress` - another refresh of the same token holds the lock
    /// * `AuthError::InvalidToken` - unknown, rotated-away or replayed token
    /// * `DomainError::CacheUnavailable` - the lock or a lookup could not reach the cache
    pub async fn refresh(
        &self,
        refresh_token: &str,
        issuer: &dyn SessionIssuer,
    ) -> DomainResult<TokenPair> {
        if !self
            .repository
            .try_lock_refresh(refresh_token, self.lock_ttl)
            .await?
        {
            return Err(AuthError::ConcurrentRefreshInProgress.into());
        }

        let outcome = self.rotate(refresh_token, issuer).await;

        // A lock left behind expires on its own TTL
        if let Err(e) = self.repository.unlock_refresh(refresh_token).await {
            warn!(token = %mask_token(refresh_token), error = %e, "Failed to release refresh lock");
        }

        outcome
    }

    async fn rotate(&self, refresh_token: &str, issuer: &dyn SessionIssuer) -> DomainResult<TokenPair> {
        let presented = self
            .repository
            .get_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let current = self
            .repository
            .get_platform_session(presented.user_id, &presented.platform)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !current.holds_refresh_token(refresh_token) {
            warn!(
                user_id = presented.user_id,
                platform = %presented.platform,
                presented_token = %mask_token(refresh_token),
                current_token = %mask_token(&current.refresh_token),
                "Stale refresh token presented"
            );
            return Err(AuthError::InvalidToken.into());
        }

        let pair = issuer
            .reissue(current.user_id, &current.platform, &current.session_id)
            .await?;
        info!(
            user_id = current.user_id,
            platform = %current.platform,
            session_id = %current.session_id,
            "Session refreshed"
        );
        Ok(pair)
    }
}
