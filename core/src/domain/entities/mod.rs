//! Domain entities representing core business objects.

pub mod reset_ticket;
pub mod session;
pub mod user;

pub use reset_ticket::{ResetTicket, RESET_CODE_LENGTH};
pub use session::SessionRecord;
pub use user::UserIdentity;
