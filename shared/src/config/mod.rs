//! Configuration module with business-specific sub-modules
//!
//! - `session` - token lifetimes and the token cipher key
//! - `cache` - cache backend selection and Redis connection settings
//! - `environment` - environment detection and logging configuration

pub mod cache;
pub mod environment;
pub mod session;

use serde::{Deserialize, Serialize};

pub use cache::{CacheConfig, CacheStrategyConfig, CacheType};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use session::SessionTokenConfig;

/// Prefix for environment overrides read by [`AppConfig::load`]
const ENV_PREFIX: &str = "SESSIONGATE";

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Session token configuration
    #[serde(default)]
    pub session: SessionTokenConfig,

    /// Cache configuration
    #[serde(default)]
    pub cache: CacheStrategyConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            session: SessionTokenConfig::default(),
            cache: CacheStrategyConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            session: SessionTokenConfig::default(),
            cache: CacheStrategyConfig::memory(),
            logging: LoggingConfig::for_environment(Environment::Development),
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            session: SessionTokenConfig::default(),
            cache: CacheStrategyConfig::default(),
            logging: LoggingConfig::for_environment(Environment::Production),
        }
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let env = Environment::from_env();
        Self {
            environment: env,
            session: SessionTokenConfig::from_env(),
            cache: CacheStrategyConfig::from_env(),
            logging: LoggingConfig::from_env(env),
        }
    }

    /// Layered load: `.env` file, then the environment's TOML file (optional),
    /// then `SESSIONGATE__*` overrides on top of the environment defaults
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = Environment::from_env();
        let base = match env {
            Environment::Production => Self::production(),
            _ => {
                let mut base = Self::development();
                base.environment = env;
                base.logging = LoggingConfig::for_environment(env);
                base
            }
        };

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&base)?)
            .add_source(config::File::with_name(&env.config_file()).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Validate the settings that would otherwise fail late at runtime
    pub fn validate(&self) -> Result<(), String> {
        self.session.validate()
    }
}
