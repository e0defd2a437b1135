pub mod keys;
pub mod repository;

pub use keys::SessionKeys;
pub use repository::{SessionRepository, SessionTtl};
