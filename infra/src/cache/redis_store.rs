//! Redis-backed CacheStore
//!
//! One multiplexed connection shared by every task. Each command runs under
//! the configured response deadline and transient failures are retried with
//! exponential backoff, except SET NX whose outcome is unknown after a
//! transport error.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client, IntoConnectionInfo, RedisError, RedisResult};
use sg_core::{CacheError, CacheStore};
use sg_shared::{mask_url, CacheConfig};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::InfrastructureError;

type RedisFuture<T> = Pin<Box<dyn Future<Output = RedisResult<T>> + Send>>;

/// Upper bound for the backoff between attempts
const MAX_RETRY_DELAY_MS: u64 = 5000;

/// Redis cache store with retry and per-command deadlines
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: MultiplexedConnection,
    max_retries: u32,
    retry_delay_ms: u64,
    response_timeout: Duration,
}

impl RedisCacheStore {
    /// Connect using the given cache configuration
    ///
    /// # Arguments
    /// * `config` - Redis URL, database, timeouts and retry settings
    ///
    /// # Returns
    /// * `Result<Self, InfrastructureError>` - Connected store or error
    pub async fn connect(config: &CacheConfig) -> Result<Self, InfrastructureError> {
        info!(
            url = %mask_url(&config.url),
            database = config.database,
            "Connecting session cache to Redis"
        );

        let mut info = config.url.as_str().into_connection_info().map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;
        if config.database != 0 {
            info.redis.db = i64::from(config.database);
        }
        let client = Client::open(info).map_err(|e| {
            InfrastructureError::Config(format!("Invalid Redis connection settings: {}", e))
        })?;

        let connection = Self::create_connection_with_retry(
            client,
            config.max_retries.max(1),
            config.retry_delay_ms,
            Duration::from_secs(config.connection_timeout),
        )
        .await?;

        info!("Redis session cache connected");

        Ok(Self {
            connection,
            max_retries: config.max_retries.max(1),
            retry_delay_ms: config.retry_delay_ms,
            response_timeout: Duration::from_secs(config.response_timeout),
        })
    }

    async fn create_connection_with_retry(
        client: Client,
        max_retries: u32,
        retry_delay_ms: u64,
        connect_timeout: Duration,
    ) -> Result<MultiplexedConnection, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = retry_delay_ms;

        loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            let outcome = match timeout(connect_timeout, client.get_multiplexed_async_connection()).await {
                Ok(result) => result.map_err(InfrastructureError::Cache),
                Err(_) => Err(InfrastructureError::Timeout {
                    operation: "connect".to_string(),
                    after_ms: connect_timeout.as_millis() as u64,
                }),
            };

            match outcome {
                Ok(connection) => return Ok(connection),
                Err(e) if attempts < max_retries => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY_MS);
                }
                Err(e) => {
                    error!("Failed to connect to Redis after {} attempts: {}", attempts, e);
                    return Err(e);
                }
            }
        }
    }

    /// Run one command under the response deadline, retrying transient errors
    async fn execute<F, T>(&self, operation: &'static str, retry: bool, command: F) -> Result<T, CacheError>
    where
        F: Fn(MultiplexedConnection) -> RedisFuture<T>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay_ms;

        loop {
            attempts += 1;
            let conn = self.connection.clone();

            let err = match timeout(self.response_timeout, command(conn)).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => InfrastructureError::Cache(e),
                Err(_) => InfrastructureError::Timeout {
                    operation: operation.to_string(),
                    after_ms: self.response_timeout.as_millis() as u64,
                },
            };

            if retry && attempts < self.max_retries && err.is_retriable() {
                warn!(
                    "Redis {} failed (attempt {}/{}): {}. Retrying in {}ms...",
                    operation, attempts, self.max_retries, err, delay
                );
                sleep(Duration::from_millis(delay)).await;
                delay = (delay * 2).min(MAX_RETRY_DELAY_MS);
                continue;
            }

            error!("Redis {} failed after {} attempts: {}", operation, attempts, err);
            return Err(err.into_cache_error(operation));
        }
    }

    /// PING the server
    pub async fn health_check(&self) -> Result<bool, CacheError> {
        let response = self
            .execute("ping", true, |mut conn| {
                Box::pin(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            })
            .await?;
        Ok(response == "PONG")
    }

    /// Remaining TTL of a key in seconds, `None` if absent or without expiry
    pub async fn ttl(&self, key: &str) -> Result<Option<i64>, CacheError> {
        let key = key.to_string();
        let ttl = self
            .execute("ttl", true, move |mut conn| {
                let key = key.clone();
                Box::pin(async move { conn.ttl::<_, i64>(key).await })
            })
            .await?;
        Ok((ttl >= 0).then_some(ttl))
    }
}

/// Whole seconds for Redis expiry arguments; never zero
fn expiry_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        debug!(key, "Redis GET");
        let key = key.to_string();
        self.execute("get", true, move |mut conn| {
            let key = key.clone();
            Box::pin(async move { conn.get::<_, Option<String>>(key).await })
        })
        .await
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        debug!(key, ttl_secs = ttl.as_secs(), "Redis SET EX");
        let (key, value, secs) = (key.to_string(), value.to_string(), expiry_secs(ttl));
        self.execute("set_with_expiry", true, move |mut conn| {
            let (key, value) = (key.clone(), value.clone());
            Box::pin(async move { conn.set_ex::<_, _, ()>(key, value, secs).await })
        })
        .await
    }

    async fn set_nx_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CacheError> {
        debug!(key, ttl_secs = ttl.as_secs(), "Redis SET NX EX");
        let (key, value, secs) = (key.to_string(), value.to_string(), expiry_secs(ttl));
        let reply = self
            .execute("set_nx_with_expiry", false, move |mut conn| {
                let (key, value) = (key.clone(), value.clone());
                Box::pin(async move {
                    redis::cmd("SET")
                        .arg(key)
                        .arg(value)
                        .arg("NX")
                        .arg("EX")
                        .arg(secs)
                        .query_async::<_, Option<String>>(&mut conn)
                        .await
                })
            })
            .await?;
        Ok(reply.is_some())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        debug!(key, field, "Redis HGET");
        let (key, field) = (key.to_string(), field.to_string());
        self.execute("hget", true, move |mut conn| {
            let (key, field) = (key.clone(), field.clone());
            Box::pin(async move { conn.hget::<_, _, Option<String>>(key, field).await })
        })
        .await
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), CacheError> {
        debug!(key, field, "Redis HSET");
        let (key, field, value) = (key.to_string(), field.to_string(), value.to_string());
        self.execute("hset", true, move |mut conn| {
            let (key, field, value) = (key.clone(), field.clone(), value.clone());
            Box::pin(async move { conn.hset::<_, _, _, ()>(key, field, value).await })
        })
        .await
    }

    async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        debug!(key, "Redis HGETALL");
        let key = key.to_string();
        self.execute("hget_all", true, move |mut conn| {
            let key = key.clone();
            Box::pin(async move { conn.hgetall::<_, HashMap<String, String>>(key).await })
        })
        .await
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, CacheError> {
        debug!(key, field, "Redis HDEL");
        let (key, field) = (key.to_string(), field.to_string());
        let removed = self
            .execute("hdel", true, move |mut conn| {
                let (key, field) = (key.clone(), field.clone());
                Box::pin(async move { conn.hdel::<_, _, u32>(key, field).await })
            })
            .await?;
        Ok(removed > 0)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        debug!(key, "Redis DEL");
        let key = key.to_string();
        let deleted = self
            .execute("delete", true, move |mut conn| {
                let key = key.clone();
                Box::pin(async move { conn.del::<_, u32>(key).await })
            })
            .await?;
        Ok(deleted > 0)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        debug!(key, ttl_secs = ttl.as_secs(), "Redis EXPIRE LT");
        let (key, secs) = (key.to_string(), expiry_secs(ttl));
        self.execute("expire", true, move |mut conn| {
            let key = key.clone();
            Box::pin(async move {
                redis::cmd("EXPIRE")
                    .arg(key)
                    .arg(secs)
                    .arg("LT")
                    .query_async::<_, bool>(&mut conn)
                    .await
            })
        })
        .await
    }
}

impl InfrastructureError {
    /// Whether a retry may succeed
    pub fn is_retriable(&self) -> bool {
        match self {
            InfrastructureError::Cache(e) => is_retriable_redis_error(e),
            InfrastructureError::Timeout { .. } => true,
            _ => false,
        }
    }
}

fn is_retriable_redis_error(error: &RedisError) -> bool {
    matches!(
        error.kind(),
        redis::ErrorKind::IoError
            | redis::ErrorKind::ClientError
            | redis::ErrorKind::BusyLoadingError
            | redis::ErrorKind::TryAgain
    )
}
