//! Issuance, rotation, verification and revocation of session credentials

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sg_shared::is_token_shaped;
use tracing::{debug, info, warn};

use crate::codec::TokenCodec;
use crate::domain::entities::SessionRecord;
use crate::domain::value_objects::{TokenPair, TokenVerification};
use crate::errors::{AuthError, DomainResult};
use crate::repositories::{IdentityDirectory, SessionRepository};

use super::config::AuthTokenServiceConfig;
use super::coordinator::{RefreshCoordinator, SessionIssuer};

/// Entry point for everything outside the session subsystem
///
/// Holds no per-request state; share one instance behind an `Arc`.
pub struct AuthTokenService {
    codec: TokenCodec,
    repository: Arc<SessionRepository>,
    coordinator: RefreshCoordinator,
    identity: Arc<dyn IdentityDirectory>,
    config: AuthTokenServiceConfig,
}

impl AuthTokenService {
    /// Create a new token service
    ///
    /// # Arguments
    ///
    /// * `codec` - Token encoder shared by every node
    /// * `repository` - Session storage
    /// * `identity` - User directory consulted before issuing
    /// * `config` - Lifetimes applied outside the repository
    pub fn new(
        codec: TokenCodec,
        repository: Arc<SessionRepository>,
        identity: Arc<dyn IdentityDirectory>,
        config: AuthTokenServiceConfig,
    ) -> Self {
        let coordinator = RefreshCoordinator::new(repository.clone(), config.refresh_lock_ttl);
        Self {
            codec,
            repository,
            coordinator,
            identity,
            config,
        }
    }

    /// Start a new session after the caller authenticated the user
    ///
    /// Replaces any session the user already holds on `platform`.
    ///
    /// # Errors
    ///
    /// * `AuthError::UserInvalid` - user missing or blocked
    pub async fn issue_for_login(&self, user_id: i64, platform: &str) -> DomainResult<TokenPair> {
        self.ensure_user_may_login(user_id).await?;

        let session_id = TokenCodec::generate_session_id(user_id);
        let pair = self.issue(user_id, platform, &session_id).await?;
        info!(user_id, platform, session_id = %session_id, "User logged in");
        Ok(pair)
    }

    /// Mint and store a pair for (user, platform) under `session_id`
    ///
    /// The previous platform session is read before the new one is written,
    /// then its access token is deleted and its refresh token moved into the
    /// grace window. The whole sequence holds the slot's issue lock; at most
    /// one pair per slot is ever approvable.
    ///
    /// # Errors
    ///
    /// * `AuthError::SessionBusy` - another issue for the same slot holds the lock
    pub async fn issue(&self, user_id: i64, platform: &str, session_id: &str) -> DomainResult<TokenPair> {
        if !self
            .repository
            .try_lock_issue(user_id, platform, self.config.refresh_lock_ttl)
            .await?
        {
            return Err(AuthError::SessionBusy.into());
        }

        let outcome = self.replace_session(user_id, platform, session_id).await;

        if let Err(e) = self.repository.unlock_issue(user_id, platform).await {
            warn!(user_id, platform, error = %e, "Failed to release issue lock");
        }

        outcome
    }

    async fn replace_session(&self, user_id: i64, platform: &str, session_id: &str) -> DomainResult<TokenPair> {
        let (access_token, refresh_token) = self.codec.mint_pair(user_id)?;

        let previous = self.repository.get_platform_session(user_id, platform).await?;

        let session = SessionRecord::new(
            user_id,
            platform,
            session_id,
            access_token.clone(),
            refresh_token.clone(),
        );
        self.repository.put_session(&session).await?;

        if let Some(old) = previous {
            self.repository.revoke_access_token(&old.access_token).await?;
            self.repository
                .expire_refresh_token_soon(&old.refresh_token, self.repository.grace())
                .await?;
        }

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.config.access_token_ttl.as_secs() as i64,
        ))
    }

    /// Exchange a refresh token for a new pair with the same session id
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        if !is_token_shaped(refresh_token) {
            return Err(AuthError::InvalidToken.into());
        }
        self.coordinator.refresh(refresh_token, self).await
    }

    /// Check an access token; called once per authenticated request
    ///
    /// A miss is `approved = false`. A cache failure is an error, which the
    /// caller must treat as not approved.
    pub async fn verify(&self, access_token: &str) -> DomainResult<TokenVerification> {
        if !is_token_shaped(access_token) {
            return Ok(TokenVerification::rejected());
        }

        Ok(match self.repository.get_by_access_token(access_token).await? {
            Some(session) => TokenVerification::approved(&session),
            None => TokenVerification::rejected(),
        })
    }

    /// End the session on one platform; a missing session is not an error
    pub async fn logout(&self, user_id: i64, platform: &str) -> DomainResult<()> {
        let Some(session) = self.repository.get_platform_session(user_id, platform).await? else {
            debug!(user_id, platform, "Logout without a live session");
            return Ok(());
        };

        self.repository.revoke_access_token(&session.access_token).await?;
        self.repository.revoke_refresh_token(&session.refresh_token).await?;
        self.repository.remove_platform_session(user_id, platform).await?;

        info!(user_id, platform, session_id = %session.session_id, "User logged out");
        Ok(())
    }

    /// Invalidate every session of a user, e.g. after a password change
    pub async fn revoke_all_sessions(&self, user_id: i64) -> DomainResult<()> {
        self.repository.revoke_all_sessions(user_id).await?;
        info!(user_id, "All sessions revoked");
        Ok(())
    }

    /// Live sessions of a user keyed by platform
    pub async fn list_sessions(&self, user_id: i64) -> DomainResult<HashMap<String, SessionRecord>> {
        self.repository.get_all_sessions(user_id).await
    }

    /// Recover the user id a token was minted for without consulting the cache
    ///
    /// Says nothing about whether the token is still valid. Only for
    /// read-only features that keep working while the cache is down; never
    /// grant access based on it.
    pub fn identify_unverified(&self, token: &str) -> DomainResult<i64> {
        Ok(self.codec.decode(token)?)
    }

    async fn ensure_user_may_login(&self, user_id: i64) -> DomainResult<()> {
        match self.identity.lookup_user(user_id).await? {
            Some(identity) if identity.may_login() => Ok(()),
            Some(_) => {
                warn!(user_id, "Blocked user denied a session");
                Err(AuthError::UserInvalid.into())
            }
            None => Err(AuthError::UserInvalid.into()),
        }
    }
}

#[async_trait]
impl SessionIssuer for AuthTokenService {
    /// Refreshes re-check the user so a block takes effect at the next rotation
    async fn reissue(&self, user_id: i64, platform: &str, session_id: &str) -> DomainResult<TokenPair> {
        self.ensure_user_may_login(user_id).await?;
        self.issue(user_id, platform, session_id).await
    }
}
