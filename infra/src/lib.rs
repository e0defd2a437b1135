//! # Infrastructure Layer
//!
//! Concrete cache stores for the SessionGate session backbone and the
//! bootstrap that wires configuration, logging, cache and services together.
//!
//! ## Architecture
//!
//! - **Cache**: Redis store for shared deployments, memory store for
//!   development and tests
//! - **Bootstrap**: [`initialize`] turns an [`AppConfig`] into ready services

use std::sync::Arc;

use sg_core::{
    AuthTokenService, AuthTokenServiceConfig, CacheError, CacheStore, DomainError,
    IdentityDirectory, PasswordResetService, SessionKeys, SessionRepository, SessionTtl,
    TokenCodec,
};
use sg_shared::{init_logging, AppConfig};

/// Cache module - Redis and in-memory stores
pub mod cache;

pub use cache::{build_cache_store, MemoryCacheStore, RedisCacheStore};

/// Session services sharing one repository and cache store
#[derive(Clone)]
pub struct AuthServices {
    pub tokens: Arc<AuthTokenService>,
    pub password_reset: Arc<PasswordResetService>,
    pub repository: Arc<SessionRepository>,
    pub cache: Arc<dyn CacheStore>,
}

impl AuthServices {
    /// Wire the services over an existing cache store
    pub fn assemble(
        config: &AppConfig,
        cache: Arc<dyn CacheStore>,
        identity: Arc<dyn IdentityDirectory>,
    ) -> Result<Self, InfrastructureError> {
        config.validate().map_err(InfrastructureError::Config)?;

        let codec = TokenCodec::new(config.session.token_key.as_bytes())?;
        let keys = SessionKeys::with_prefix(config.cache.redis.key_prefix.as_deref());
        let repository = Arc::new(SessionRepository::new(
            cache.clone(),
            keys,
            SessionTtl::from(&config.session),
        ));

        let tokens = Arc::new(AuthTokenService::new(
            codec,
            repository.clone(),
            identity.clone(),
            AuthTokenServiceConfig::from(&config.session),
        ));
        let password_reset = Arc::new(PasswordResetService::new(
            cache.clone(),
            repository.clone(),
            identity,
            config.session.password_reset_duration(),
        ));

        Ok(Self {
            tokens,
            password_reset,
            repository,
            cache,
        })
    }
}

/// Initialize infrastructure services
///
/// Installs the global subscriber, so call it once per process.
///
/// This function sets up:
/// - The global tracing subscriber
/// - The configured cache store (Redis connection or in-process store)
/// - Session and password reset services sharing one repository
pub async fn initialize(
    config: &AppConfig,
    identity: Arc<dyn IdentityDirectory>,
) -> Result<AuthServices, InfrastructureError> {
    init_logging(&config.logging).map_err(InfrastructureError::Config)?;
    tracing::info!(
        environment = %config.environment,
        cache = ?config.cache.cache_type,
        default_token_key = config.session.is_using_default_key(),
        "Initializing session services..."
    );

    let cache = build_cache_store(&config.cache).await?;
    let services = AuthServices::assemble(config, cache, identity)?;

    tracing::info!("Session services initialized successfully");
    Ok(services)
}

/// Load configuration from `.env`, the environment's config file and the environment
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    let config = AppConfig::load().map_err(|e| InfrastructureError::Config(e.to_string()))?;
    config.validate().map_err(InfrastructureError::Config)?;
    Ok(config)
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// A command or connection attempt exceeded its deadline
    #[error("Cache {operation} timed out after {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Domain error raised while wiring services
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl InfrastructureError {
    /// Convert into the port-level error, tagged with the failed primitive
    pub fn into_cache_error(self, operation: &str) -> CacheError {
        CacheError::new(operation, self.to_string())
    }
}
