//! Cache stores backing session state
//!
//! - `redis_store` - shared Redis instance; required when several nodes serve traffic
//! - `memory_store` - process-local store for development and tests

pub mod memory_store;
pub mod redis_store;

use std::sync::Arc;

use sg_core::CacheStore;
use sg_shared::{CacheStrategyConfig, CacheType};
use tracing::warn;

use crate::InfrastructureError;

pub use memory_store::MemoryCacheStore;
pub use redis_store::RedisCacheStore;

// Re-export commonly used types
pub use sg_shared::config::cache::CacheConfig;

/// Build the cache store selected by `config.cache_type`
pub async fn build_cache_store(
    config: &CacheStrategyConfig,
) -> Result<Arc<dyn CacheStore>, InfrastructureError> {
    match config.cache_type {
        CacheType::Redis => {
            let store = RedisCacheStore::connect(&config.redis).await?;
            Ok(Arc::new(store))
        }
        CacheType::Memory => {
            warn!("Using the in-process session cache; sessions are lost on restart and not shared between nodes");
            Ok(Arc::new(MemoryCacheStore::new()))
        }
    }
}
