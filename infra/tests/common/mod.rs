//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Once, RwLock};

use async_trait::async_trait;
use sg_core::{DomainError, IdentityDirectory, UserIdentity};
use sg_infra::{AuthServices, MemoryCacheStore};
use sg_shared::AppConfig;

static LOGGING: Once = Once::new();

/// Route service logs to the test harness output
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("sg_core=debug,sg_infra=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Identity directory backed by a fixed user table
#[derive(Clone, Default)]
pub struct StaticDirectory {
    users: Arc<RwLock<HashMap<i64, UserIdentity>>>,
}

impl StaticDirectory {
    pub fn with_active(user_ids: &[i64]) -> Self {
        let directory = Self::default();
        for &id in user_ids {
            directory.set(UserIdentity::active(id));
        }
        directory
    }

    pub fn set(&self, identity: UserIdentity) {
        self.users.write().unwrap().insert(identity.user_id, identity);
    }
}

#[async_trait]
impl IdentityDirectory for StaticDirectory {
    async fn lookup_user(&self, user_id: i64) -> Result<Option<UserIdentity>, DomainError> {
        Ok(self.users.read().unwrap().get(&user_id).copied())
    }
}

/// Services over a fresh memory store, users 1001 and 2002 active
pub fn memory_services() -> (AuthServices, MemoryCacheStore, StaticDirectory) {
    init_test_logging();
    let store = MemoryCacheStore::new();
    let directory = StaticDirectory::with_active(&[1001, 2002]);
    let services = AuthServices::assemble(
        &AppConfig::development(),
        Arc::new(store.clone()),
        Arc::new(directory.clone()),
    )
    .expect("development config is valid");
    (services, store, directory)
}
