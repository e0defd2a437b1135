//! Shared utilities and common types for the SessionGate workspace
//!
//! - Configuration types loaded from the environment
//! - Tracing subscriber bootstrap
//! - Log masking and token shape helpers

pub mod config;
pub mod logging;
pub mod utils;

pub use config::{
    AppConfig, CacheConfig, CacheStrategyConfig, CacheType, Environment, LogFormat,
    LoggingConfig, SessionTokenConfig,
};
pub use logging::init_logging;
pub use utils::{is_token_shaped, mask_token, mask_url, TOKEN_LENGTH};
