use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::SignError;

type HmacSha1 = Hmac<Sha1>;

/// HMAC-SHA1 of `data` under `key`, base64 encoded.
pub fn hmac_sha1_base64(key: &[u8], data: &[u8]) -> Result<String, SignError> {
    let mut mac = HmacSha1::new_from_slice(key)
        .map_err(|e| SignError::Configuration(format!("Failed to create HMAC-SHA1: {e}")))?;

    mac.update(data);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
