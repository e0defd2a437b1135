//! Domain layer containing session entities and value objects.

pub mod entities;
pub mod value_objects;

pub use entities::{ResetTicket, SessionRecord, UserIdentity, RESET_CODE_LENGTH};
pub use value_objects::{TokenPair, TokenVerification};
