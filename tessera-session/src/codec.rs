//! Cookie token codec.
//!
//! A session identifier never leaves the server in clear. The cookie carries
//! the AES-CBC ciphertext of the identifier, hex encoded. Two token formats
//! exist:
//!
//! - [`TokenFormat::Legacy`] uses the first 16 key bytes as IV. Identical
//!   identifiers always produce identical tokens under one key; kept for
//!   interoperability with cookies issued by older deployments.
//! - [`TokenFormat::RandomIv`] draws a fresh IV per token and prepends it to
//!   the ciphertext, tagged `v2.` so both formats decode side by side.
//!
//! # Examples
//!
//! ```
//! use tessera_session::{TokenCodec, TokenFormat};
//!
//! let codec = TokenCodec::new("0123456789abcdef", TokenFormat::RandomIv).unwrap();
//! let token = codec.encode("session-42").unwrap();
//! assert!(token.starts_with("v2."));
//! assert_eq!(codec.decode(&token).unwrap(), "session-42");
//! ```

use crate::error::CodecError;
use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

const RANDOM_IV_TAG: &str = "v2.";

/// Wire format used when encoding new tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenFormat {
    /// `hex(AES-CBC(key, iv = key[..16], id))`
    Legacy,
    /// `"v2." + hex(iv || AES-CBC(key, iv, id))` with a random IV
    #[default]
    RandomIv,
}

/// Encrypts session identifiers into cookie tokens and back.
#[derive(Clone)]
pub struct TokenCodec {
    key: Vec<u8>,
    format: TokenFormat,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("key", &format_args!("<{} bytes>", self.key.len()))
            .field("format", &self.format)
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec. The key selects AES-128/192/256 by its length.
    pub fn new(key: impl AsRef<[u8]>, format: TokenFormat) -> Result<Self, CodecError> {
        let key = key.as_ref();
        validate_key(key)?;
        Ok(Self {
            key: key.to_vec(),
            format,
        })
    }

    /// Format used for newly encoded tokens.
    pub fn format(&self) -> TokenFormat {
        self.format
    }

    /// Encode a session identifier into a cookie token.
    pub fn encode(&self, id: &str) -> Result<String, CodecError> {
        match self.format {
            TokenFormat::Legacy => encode(&self.key, id),
            TokenFormat::RandomIv => {
                let iv: [u8; BLOCK_SIZE] = rand::random();
                let ciphertext = encrypt(&self.key, &iv, id.as_bytes())?;
                let mut payload = Vec::with_capacity(BLOCK_SIZE + ciphertext.len());
                payload.extend_from_slice(&iv);
                payload.extend_from_slice(&ciphertext);
                Ok(format!("{}{}", RANDOM_IV_TAG, hex::encode(payload)))
            }
        }
    }

    /// Decode a cookie token back into the session identifier.
    ///
    /// Both token formats are accepted whatever format this codec encodes.
    pub fn decode(&self, token: &str) -> Result<String, CodecError> {
        if let Some(body) = token.strip_prefix(RANDOM_IV_TAG) {
            let payload = hex::decode(body).map_err(|_| CodecError::InvalidHex)?;
            if payload.len() < 2 * BLOCK_SIZE {
                return Err(CodecError::InvalidLength(payload.len()));
            }
            let (iv, ciphertext) = payload.split_at(BLOCK_SIZE);
            return decrypt(&self.key, iv, ciphertext);
        }

        if let Some((tag, _)) = token.split_once('.')
            && tag.starts_with('v')
        {
            return Err(CodecError::UnsupportedVersion(tag.to_string()));
        }

        decode(&self.key, token)
    }
}

/// Encode `id` in the legacy format: IV taken from the key itself.
pub fn encode(key: &[u8], id: &str) -> Result<String, CodecError> {
    validate_key(key)?;
    let ciphertext = encrypt(key, &key[..BLOCK_SIZE], id.as_bytes())?;
    Ok(hex::encode(ciphertext))
}

/// Decode a legacy-format token produced by [`encode`].
pub fn decode(key: &[u8], token: &str) -> Result<String, CodecError> {
    validate_key(key)?;
    let ciphertext = hex::decode(token).map_err(|_| CodecError::InvalidHex)?;
    decrypt(key, &key[..BLOCK_SIZE], &ciphertext)
}

/// Short, non-reversible prefix of a token for log lines.
pub(crate) fn fingerprint(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

fn validate_key(key: &[u8]) -> Result<(), CodecError> {
    match key.len() {
        16 | 24 | 32 => Ok(()),
        n => Err(CodecError::InvalidKeyLength(n)),
    }
}

fn encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
    match key.len() {
        16 => cbc_encrypt::<Aes128>(key, iv, plaintext),
        24 => cbc_encrypt::<Aes192>(key, iv, plaintext),
        32 => cbc_encrypt::<Aes256>(key, iv, plaintext),
        n => Err(CodecError::InvalidKeyLength(n)),
    }
}

fn decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<String, CodecError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CodecError::InvalidLength(ciphertext.len()));
    }

    let mut plaintext = match key.len() {
        16 => cbc_decrypt::<Aes128>(key, iv, ciphertext)?,
        24 => cbc_decrypt::<Aes192>(key, iv, ciphertext)?,
        32 => cbc_decrypt::<Aes256>(key, iv, ciphertext)?,
        n => return Err(CodecError::InvalidKeyLength(n)),
    };

    // Only the pad length is checked, matching the legacy decoder.
    let pad = plaintext[plaintext.len() - 1];
    if pad == 0 || pad as usize > BLOCK_SIZE {
        return Err(CodecError::InvalidPadding(pad));
    }
    plaintext.truncate(plaintext.len() - pad as usize);

    String::from_utf8(plaintext).map_err(|_| CodecError::InvalidUtf8)
}

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CodecError>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CodecError::InvalidKeyLength(key.len()))?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CodecError>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CodecError::InvalidKeyLength(key.len()))?;
    decryptor
        .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
        .map_err(|_| CodecError::InvalidLength(ciphertext.len()))
}
