//! Ports to external state and the repository built on them.

pub mod cache;
pub mod identity;
pub mod session;

pub use cache::CacheStore;
pub use identity::IdentityDirectory;
pub use session::{SessionKeys, SessionRepository, SessionTtl};

#[cfg(test)]
pub use cache::MockCacheStore;
#[cfg(test)]
pub use identity::MockIdentityDirectory;
