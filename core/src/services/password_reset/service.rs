//! Password reset tickets and the session purge that follows a reset

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::entities::{ResetTicket, RESET_CODE_LENGTH};
use crate::errors::{AuthError, DomainError, DomainResult};
use crate::repositories::{CacheStore, IdentityDirectory, SessionRepository};

/// Issues and redeems short-lived reset tickets
///
/// Delivering the code and storing the new password hash stay with the
/// caller; this service only proves that the two halves of a ticket match.
pub struct PasswordResetService {
    cache: Arc<dyn CacheStore>,
    repository: Arc<SessionRepository>,
    identity: Arc<dyn IdentityDirectory>,
    ticket_ttl: Duration,
}

impl PasswordResetService {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        repository: Arc<SessionRepository>,
        identity: Arc<dyn IdentityDirectory>,
        ticket_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            repository,
            identity,
            ticket_ttl,
        }
    }

    /// Open a reset ticket for a user
    ///
    /// # Returns
    /// * `Ok((token, code))` - 32-hex-char ticket token and the 6-digit code to deliver
    /// * `Err(AuthError::UserInvalid)` - user missing or blocked
    pub async fn apply(&self, user_id: i64) -> DomainResult<(String, String)> {
        self.ensure_user_active(user_id).await?;

        let token = Uuid::new_v4().simple().to_string();
        let code = generate_code();
        let ticket = ResetTicket::new(user_id, code.clone());

        self.cache
            .set_with_expiry(
                &self.repository.keys().password_reset(&token),
                &ticket.to_cache_value(),
                self.ticket_ttl,
            )
            .await
            .map_err(|e| DomainError::from(e.within("apply_password_reset")))?;

        info!(user_id, "Password reset ticket issued");
        Ok((token, code))
    }

    /// Redeem a ticket and end every session of its user
    ///
    /// Returns the user id so the caller can store the new password hash.
    /// The ticket is consumed only on success. Deleting it is the claim:
    /// of two concurrent redeems only the one whose delete removed the key
    /// succeeds.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidResetTicket` - unknown or expired ticket, wrong code, or already claimed
    /// * `AuthError::UserInvalid` - the user disappeared or was blocked meanwhile
    /// * `DomainError::CacheUnavailable` - the ticket could not be read or claimed
    pub async fn redeem(&self, token: &str, code: &str) -> DomainResult<i64> {
        let key = self.repository.keys().password_reset(token);
        let raw = self
            .cache
            .get(&key)
            .await
            .map_err(|e| DomainError::from(e.within("redeem_password_reset")))?;

        let ticket = raw
            .as_deref()
            .and_then(ResetTicket::parse)
            .ok_or(AuthError::InvalidResetTicket)?;
        if !ticket.matches_code(code) {
            return Err(AuthError::InvalidResetTicket.into());
        }

        self.ensure_user_active(ticket.user_id).await?;

        let claimed = self
            .cache
            .delete(&key)
            .await
            .map_err(|e| DomainError::from(e.within("redeem_password_reset")))?;
        if !claimed {
            warn!(user_id = ticket.user_id, "Reset ticket already redeemed");
            return Err(AuthError::InvalidResetTicket.into());
        }
        if let Err(e) = self.repository.revoke_all_sessions(ticket.user_id).await {
            error!(user_id = ticket.user_id, error = %e, "Failed to revoke sessions after password reset");
        }

        info!(user_id = ticket.user_id, "Password reset ticket redeemed");
        Ok(ticket.user_id)
    }

    async fn ensure_user_active(&self, user_id: i64) -> DomainResult<()> {
        match self.identity.lookup_user(user_id).await? {
            Some(identity) if identity.may_login() => Ok(()),
            _ => Err(AuthError::UserInvalid.into()),
        }
    }
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..RESET_CODE_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
