//! AES-128-CBC token codec
//!
//! Token layout, hex encoded to 40 characters:
//!
//! ```text
//! md5(payload)[..4] ‖ aes128cbc(pkcs7(payload))
//! payload = be_u64(user_id) ‖ be_u32(issue time in nanoseconds, truncated)
//! ```
//!
//! The IV is the key itself and the checksum prefix is never verified on
//! decode. Both are kept as-is so tokens already held by clients stay valid.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use rand::Rng;

use sg_shared::config::session::TOKEN_KEY_LENGTH;
use sg_shared::TOKEN_LENGTH;

use crate::errors::{DomainError, TokenError};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Bytes of the plaintext payload (user id + truncated timestamp)
pub const PAYLOAD_LENGTH: usize = 12;

/// Bytes of the MD5 prefix kept in the token
pub const CHECKSUM_LENGTH: usize = 4;

/// Bytes of ciphertext (one AES block)
pub const CIPHERTEXT_LENGTH: usize = 16;

/// Stateless encoder/decoder for access and refresh tokens
#[derive(Clone)]
pub struct TokenCodec {
    key: [u8; TOKEN_KEY_LENGTH],
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Creates a codec from the raw key bytes
    ///
    /// # Errors
    ///
    /// `DomainError::Config` unless the key is exactly 16 bytes.
    pub fn new(key: &[u8]) -> Result<Self, DomainError> {
        let key: [u8; TOKEN_KEY_LENGTH] = key.try_into().map_err(|_| DomainError::Config {
            message: format!(
                "token key must be {} bytes, got {}",
                TOKEN_KEY_LENGTH,
                key.len()
            ),
        })?;
        Ok(Self { key })
    }

    /// Encodes `user_id` and the issue instant into a 40-character token
    ///
    /// Only the low 32 bits of the nanosecond timestamp are kept; they add
    /// entropy and are never read back.
    pub fn encode(&self, user_id: i64, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        if user_id <= 0 {
            return Err(TokenError::Value);
        }

        let mut payload = [0u8; PAYLOAD_LENGTH];
        payload[..8].copy_from_slice(&(user_id as u64).to_be_bytes());
        let truncated = issued_at.timestamp_nanos_opt().unwrap_or_default() as u32;
        payload[8..].copy_from_slice(&truncated.to_be_bytes());

        let ciphertext = Aes128CbcEnc::new(&self.key.into(), &self.key.into())
            .encrypt_padded_vec_mut::<Pkcs7>(&payload);
        let checksum = Md5::digest(payload);

        let mut raw = Vec::with_capacity(CHECKSUM_LENGTH + CIPHERTEXT_LENGTH);
        raw.extend_from_slice(&checksum[..CHECKSUM_LENGTH]);
        raw.extend_from_slice(&ciphertext);
        Ok(hex::encode(raw))
    }

    /// Recovers the user id from a token
    ///
    /// The checksum prefix is skipped, not compared.
    ///
    /// # Errors
    ///
    /// * `TokenError::Format` - not 40 characters or not hex
    /// * `TokenError::Crypto` - ciphertext does not decrypt to a padded payload
    /// * `TokenError::Value` - the payload carries user id 0
    pub fn decode(&self, token: &str) -> Result<i64, TokenError> {
        if token.len() != TOKEN_LENGTH {
            return Err(TokenError::Format);
        }
        let raw = hex::decode(token).map_err(|_| TokenError::Format)?;

        let payload = Aes128CbcDec::new(&self.key.into(), &self.key.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&raw[CHECKSUM_LENGTH..])
            .map_err(|_| TokenError::Crypto)?;
        if payload.len() < 8 {
            return Err(TokenError::Crypto);
        }

        let mut id_bytes = [0u8; 8];
        id_bytes.copy_from_slice(&payload[..8]);
        match u64::from_be_bytes(id_bytes) {
            0 => Err(TokenError::Value),
            id => Ok(id as i64),
        }
    }

    /// Mints an access token and a refresh token for the same user
    pub fn mint_pair(&self, user_id: i64) -> Result<(String, String), TokenError> {
        let access_token = self.encode(user_id, Utc::now())?;
        let refresh_token = self.encode(user_id, Utc::now())?;
        Ok((access_token, refresh_token))
    }

    /// Session identifier in the `{user_id}-{unix_seconds}-{6 digits}` form
    pub fn generate_session_id(user_id: i64) -> String {
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
        format!("{}-{}-{:06}", user_id, Utc::now().timestamp(), suffix)
    }
}
