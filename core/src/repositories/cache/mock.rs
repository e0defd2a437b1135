//! In-memory CacheStore for unit tests, with per-primitive failure injection

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::errors::CacheError;

use super::store::CacheStore;

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Mock cache store for testing
#[derive(Clone, Default)]
pub struct MockCacheStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    failing: Arc<Mutex<HashSet<&'static str>>>,
}

impl MockCacheStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of the named primitive fail
    pub async fn fail_on(&self, operation: &'static str) {
        self.failing.lock().await.insert(operation);
    }

    /// Stop injecting failures
    pub async fn heal(&self) {
        self.failing.lock().await.clear();
    }

    /// Remaining TTL of a live key, `None` if absent or without expiry
    pub async fn ttl_of(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| e.expires_at)
            .map(|at| at - now)
    }

    /// Whether a live key exists
    pub async fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .get(key)
            .map_or(false, |e| e.is_live(now))
    }

    /// Store raw text, bypassing serialization
    pub async fn insert_raw(&self, key: &str, value: &str) {
        self.entries.lock().await.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: None,
            },
        );
    }

    async fn check(&self, operation: &'static str) -> Result<(), CacheError> {
        if self.failing.lock().await.contains(operation) {
            return Err(CacheError::new(operation, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MockCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check("get").await?;
        let now = Instant::now();
        let entries = self.entries.lock().await;
        match entries.get(key).filter(|e| e.is_live(now)) {
            Some(Entry { value: Value::Text(text), .. }) => Ok(Some(text.clone())),
            Some(_) => Err(CacheError::new("get", "WRONGTYPE")),
            None => Ok(None),
        }
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.check("set_with_expiry").await?;
        self.entries.lock().await.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn set_nx_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        self.check("set_nx_with_expiry").await?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if entries.get(key).map_or(false, |e| e.is_live(now)) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: Some(now + ttl),
            },
        );
        Ok(true)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        self.check("hget").await?;
        let now = Instant::now();
        let entries = self.entries.lock().await;
        match entries.get(key).filter(|e| e.is_live(now)) {
            Some(Entry { value: Value::Hash(hash), .. }) => Ok(hash.get(field).cloned()),
            Some(_) => Err(CacheError::new("hget", "WRONGTYPE")),
            None => Ok(None),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), CacheError> {
        self.check("hset").await?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if !entries.get(key).map_or(false, |e| e.is_live(now)) {
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::Hash(HashMap::new()),
                    expires_at: None,
                },
            );
        }
        match entries.get_mut(key) {
            Some(Entry { value: Value::Hash(hash), .. }) => {
                hash.insert(field.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(CacheError::new("hset", "WRONGTYPE")),
        }
    }

    async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        self.check("hget_all").await?;
        let now = Instant::now();
        let entries = self.entries.lock().await;
        match entries.get(key).filter(|e| e.is_live(now)) {
            Some(Entry { value: Value::Hash(hash), .. }) => Ok(hash.clone()),
            Some(_) => Err(CacheError::new("hget_all", "WRONGTYPE")),
            None => Ok(HashMap::new()),
        }
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, CacheError> {
        self.check("hdel").await?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let removed = match entries.get_mut(key).filter(|e| e.is_live(now)) {
            Some(Entry { value: Value::Hash(hash), .. }) => hash.remove(field).is_some(),
            Some(_) => return Err(CacheError::new("hdel", "WRONGTYPE")),
            None => false,
        };
        if matches!(entries.get(key), Some(Entry { value: Value::Hash(h), .. }) if h.is_empty()) {
            entries.remove(key);
        }
        Ok(removed)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.check("delete").await?;
        let now = Instant::now();
        Ok(self
            .entries
            .lock()
            .await
            .remove(key)
            .map_or(false, |e| e.is_live(now)))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        self.check("expire").await?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key).filter(|e| e.is_live(now)) {
            Some(entry) if entry.expires_at.map_or(true, |at| now + ttl < at) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
