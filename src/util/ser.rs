//! Helpful serialization tools.
//!
//! All cryptographic material in this crate travels as qualified text: a
//! short code prefix followed by URL-safe unpadded base64. These helpers
//! keep the base64 flavor in exactly one place.

use crate::error::Result;
use base64::Engine;

/// Convert bytes to base64
pub fn base64_encode<T: AsRef<[u8]>>(bytes: T) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes.as_ref())
}

pub fn base64_decode<T: AsRef<[u8]>>(bytes: T) -> Result<Vec<u8>> {
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(bytes.as_ref())?)
}

/// The length of the base64 text produced for `raw_len` input bytes.
pub(crate) fn base64_len(raw_len: usize) -> usize {
    (raw_len * 4 + 2) / 3
}
