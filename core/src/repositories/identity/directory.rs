//! Identity collaborator port.

use async_trait::async_trait;

use crate::domain::entities::UserIdentity;
use crate::errors::DomainError;

/// Read access to the user directory owned by the account subsystem
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Look up a user by id
    ///
    /// # Returns
    /// * `Ok(Some(identity))` - User exists (may be blocked)
    /// * `Ok(None)` - No such user, or the user was deleted
    /// * `Err(DomainError)` - The directory could not be reached
    async fn lookup_user(&self, user_id: i64) -> Result<Option<UserIdentity>, DomainError>;
}
