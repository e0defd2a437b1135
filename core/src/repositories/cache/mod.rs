pub mod store;

pub use store::CacheStore;

#[cfg(test)]
pub mod mock;
#[cfg(test)]
pub use mock::MockCacheStore;
