//! Opaque bearer token codec
//!
//! Access and refresh tokens share one format; they differ only in which
//! cache namespace stores them and for how long.

mod token_codec;

pub use token_codec::{TokenCodec, CHECKSUM_LENGTH, CIPHERTEXT_LENGTH, PAYLOAD_LENGTH};
