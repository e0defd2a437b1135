//! Cache port consumed by the session repository.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::CacheError;

/// Key-value cache with TTLs and hashes
///
/// Each primitive is individually atomic; there is no cross-key transaction.
/// Implementations must bound every call by a deadline and report transport
/// failures as [`CacheError`] carrying the primitive name.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a string value
    ///
    /// # Returns
    /// * `Ok(Some(value))` - Key present
    /// * `Ok(None)` - Key absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Write a string value that expires after `ttl`
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration)
        -> Result<(), CacheError>;

    /// Write only if the key is absent
    ///
    /// # Returns
    /// * `Ok(true)` - Value written
    /// * `Ok(false)` - Key already held
    async fn set_nx_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError>;

    /// Read one hash field
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError>;

    /// Write one hash field; the hash itself carries no TTL
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), CacheError>;

    /// Read a whole hash; an absent key yields an empty map
    async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>, CacheError>;

    /// Delete one hash field, returning whether it existed
    async fn hdel(&self, key: &str, field: &str) -> Result<bool, CacheError>;

    /// Delete a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Lower the TTL of an existing key to `ttl`
    ///
    /// Never extends a key's life: one that already expires sooner keeps its
    /// deadline (Redis `EXPIRE ... LT`). A key without a TTL counts as
    /// expiring never and is always lowered.
    ///
    /// # Returns
    /// * `Ok(true)` - Deadline moved to `ttl` from now
    /// * `Ok(false)` - Key absent, or it already expires sooner
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError>;
}
