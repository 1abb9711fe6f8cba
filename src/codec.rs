//! Codec module: wrap cipher output as printable base64 payloads
//!
//! Encoding pipeline: UTF-8 bytes -> XOR cipher -> base64.
//! Decoding reverses it. There is no authentication tag; the only
//! integrity signal is the decrypted bytes failing UTF-8 validation.

use crate::cipher;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Failure decoding a payload back to text.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decrypted bytes are not valid UTF-8 (wrong salt or secret?): {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Encrypt `text` under `salt` and wrap the result as base64.
///
/// Pure function of the text, the salt, and the fixed constants;
/// cannot fail on well-formed input.
pub fn encode(text: &str, salt: &str) -> String {
    let seed = cipher::content_seed(salt);
    let encrypted = cipher::xor_cipher(text.as_bytes(), seed);
    STANDARD.encode(encrypted)
}

/// Unwrap and decrypt a payload produced by [`encode`].
///
/// A wrong salt yields mismatched bytes; that surfaces as
/// [`DecodeError::Utf8`] only when the result is not valid text.
pub fn decode(payload: &str, salt: &str) -> Result<String, DecodeError> {
    let encrypted = STANDARD.decode(payload)?;
    let seed = cipher::content_seed(salt);
    let decrypted = cipher::xor_cipher(&encrypted, seed);
    Ok(String::from_utf8(decrypted)?)
}
