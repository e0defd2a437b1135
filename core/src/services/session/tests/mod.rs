//! Tests for the session services

use std::sync::Arc;

use crate::codec::TokenCodec;
use crate::repositories::{
    MockCacheStore, MockIdentityDirectory, SessionKeys, SessionRepository, SessionTtl,
};

use super::{AuthTokenService, AuthTokenServiceConfig};

mod service_tests;

pub(super) const TEST_KEY: &[u8] = b"fc49607d05e1a1ba";

pub(super) struct Fixture {
    pub cache: MockCacheStore,
    pub identity: MockIdentityDirectory,
    pub repository: Arc<SessionRepository>,
    pub service: Arc<AuthTokenService>,
}

/// Service over a fresh mock cache with users 1001 and 2002 active
pub(super) fn fixture() -> Fixture {
    let cache = MockCacheStore::new();
    let identity = MockIdentityDirectory::with_active_users(&[1001, 2002]);
    let repository = Arc::new(SessionRepository::new(
        Arc::new(cache.clone()),
        SessionKeys::new(),
        SessionTtl::default(),
    ));
    let service = Arc::new(AuthTokenService::new(
        TokenCodec::new(TEST_KEY).unwrap(),
        repository.clone(),
        Arc::new(identity.clone()),
        AuthTokenServiceConfig::default(),
    ));

    Fixture {
        cache,
        identity,
        repository,
        service,
    }
}
