//! Mock implementation of IdentityDirectory for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::UserIdentity;
use crate::errors::DomainError;

use super::directory::IdentityDirectory;

/// Mock identity directory for testing
#[derive(Clone, Default)]
pub struct MockIdentityDirectory {
    users: Arc<RwLock<HashMap<i64, UserIdentity>>>,
}

impl MockIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory pre-populated with active users
    pub fn with_active_users(user_ids: &[i64]) -> Self {
        let users = user_ids
            .iter()
            .map(|&id| (id, UserIdentity::active(id)))
            .collect();
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    pub async fn add_user(&self, identity: UserIdentity) {
        self.users.write().await.insert(identity.user_id, identity);
    }

    pub async fn block_user(&self, user_id: i64) {
        self.users
            .write()
            .await
            .insert(user_id, UserIdentity::blocked(user_id));
    }

    pub async fn remove_user(&self, user_id: i64) {
        self.users.write().await.remove(&user_id);
    }
}

#[async_trait]
impl IdentityDirectory for MockIdentityDirectory {
    async fn lookup_user(&self, user_id: i64) -> Result<Option<UserIdentity>, DomainError> {
        Ok(self.users.read().await.get(&user_id).copied())
    }
}
