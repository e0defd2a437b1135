//! Value objects returned to callers of the session services.

pub mod token_pair;
pub mod token_verification;

pub use token_pair::TokenPair;
pub use token_verification::TokenVerification;
