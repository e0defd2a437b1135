//! Process-local CacheStore
//!
//! For development and single-node tests only: sessions live in this process
//! and are lost on restart. Every primitive holds the store lock for its whole
//! duration, which makes each one atomic.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sg_core::{CacheError, CacheStore};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
enum Stored {
    Text(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Slot {
    value: Stored,
    expires_at: Option<Instant>,
}

impl Slot {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Default)]
struct Slots {
    inner: HashMap<String, Slot>,
}

impl Slots {
    fn evict_if_expired(&mut self, key: &str, now: Instant) {
        if self.inner.get(key).is_some_and(|slot| slot.expired(now)) {
            self.inner.remove(key);
        }
    }

    /// Live slot for `key`, dropping it first if it has expired
    fn live(&mut self, key: &str, now: Instant) -> Option<&mut Slot> {
        self.evict_if_expired(key, now);
        self.inner.get_mut(key)
    }
}

fn wrong_type(operation: &str) -> CacheError {
    CacheError::new(operation, "WRONGTYPE Operation against a key holding the wrong kind of value")
}

/// In-memory cache store with lazy expiry
#[derive(Clone, Default)]
pub struct MemoryCacheStore {
    slots: Arc<Mutex<Slots>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining TTL of a live key; `None` if absent or without expiry
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let mut slots = self.slots.lock().await;
        slots
            .live(key, now)
            .and_then(|slot| slot.expires_at)
            .map(|at| at - now)
    }

    /// Drop every expired key, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut slots = self.slots.lock().await;
        let before = slots.inner.len();
        slots.inner.retain(|_, slot| !slot.expired(now));
        let purged = before - slots.inner.len();
        if purged > 0 {
            debug!(purged, "Purged expired cache entries");
        }
        purged
    }

    /// Number of live keys
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let slots = self.slots.lock().await;
        slots.inner.values().filter(|slot| !slot.expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut slots = self.slots.lock().await;
        match slots.live(key, Instant::now()).map(|slot| &slot.value) {
            Some(Stored::Text(text)) => Ok(Some(text.clone())),
            Some(Stored::Hash(_)) => Err(wrong_type("get")),
            None => Ok(None),
        }
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let slot = Slot {
            value: Stored::Text(value.to_string()),
            expires_at: Some(Instant::now() + ttl),
        };
        self.slots.lock().await.inner.insert(key.to_string(), slot);
        Ok(())
    }

    async fn set_nx_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CacheError> {
        let now = Instant::now();
        let mut slots = self.slots.lock().await;
        if slots.live(key, now).is_some() {
            return Ok(false);
        }
        slots.inner.insert(
            key.to_string(),
            Slot {
                value: Stored::Text(value.to_string()),
                expires_at: Some(now + ttl),
            },
        );
        Ok(true)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        let mut slots = self.slots.lock().await;
        match slots.live(key, Instant::now()).map(|slot| &slot.value) {
            Some(Stored::Hash(hash)) => Ok(hash.get(field).cloned()),
            Some(Stored::Text(_)) => Err(wrong_type("hget")),
            None => Ok(None),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), CacheError> {
        let mut slots = self.slots.lock().await;
        slots.evict_if_expired(key, Instant::now());
        let slot = slots.inner.entry(key.to_string()).or_insert_with(|| Slot {
            value: Stored::Hash(HashMap::new()),
            expires_at: None,
        });
        match &mut slot.value {
            Stored::Hash(hash) => {
                hash.insert(field.to_string(), value.to_string());
                Ok(())
            }
            Stored::Text(_) => Err(wrong_type("hset")),
        }
    }

    async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        let mut slots = self.slots.lock().await;
        match slots.live(key, Instant::now()).map(|slot| &slot.value) {
            Some(Stored::Hash(hash)) => Ok(hash.clone()),
            Some(Stored::Text(_)) => Err(wrong_type("hget_all")),
            None => Ok(HashMap::new()),
        }
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, CacheError> {
        let mut slots = self.slots.lock().await;
        let (removed, now_empty) = match slots.live(key, Instant::now()) {
            Some(Slot { value: Stored::Hash(hash), .. }) => {
                let removed = hash.remove(field).is_some();
                (removed, hash.is_empty())
            }
            Some(_) => return Err(wrong_type("hdel")),
            None => return Ok(false),
        };
        // Redis drops a hash once its last field is gone
        if now_empty {
            slots.inner.remove(key);
        }
        Ok(removed)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut slots = self.slots.lock().await;
        let existed = slots.live(key, Instant::now()).is_some();
        slots.inner.remove(key);
        Ok(existed)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        let now = Instant::now();
        let mut slots = self.slots.lock().await;
        let deadline = now + ttl;
        match slots.live(key, now) {
            Some(slot) if slot.expires_at.map_or(true, |at| deadline < at) => {
                slot.expires_at = Some(deadline);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
