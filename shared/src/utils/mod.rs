//! Common utility functions

pub mod mask;
pub mod validation;

pub use mask::{mask_token, mask_url};
pub use validation::{is_token_shaped, TOKEN_LENGTH};
