use std::fmt;

use http::HeaderValue;

use crate::error::SignError;

/// An app key / app secret pair issued by the MES platform.
///
/// The key id travels in the clear as `X-AppKey`. The secret never leaves
/// the process: it is only folded into the string to sign.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    key_id: String,
    secret: String,
}

impl Credential {
    pub fn new(key_id: impl Into<String>, secret: impl Into<String>) -> Result<Self, SignError> {
        let key_id = key_id.into();
        let secret = secret.into();

        if key_id.is_empty() {
            return Err(SignError::InvalidCredential("key id is empty".into()));
        }
        if secret.is_empty() {
            return Err(SignError::InvalidCredential("secret is empty".into()));
        }
        HeaderValue::from_str(&key_id).map_err(|e| {
            SignError::InvalidCredential(format!("key id is not a valid header value: {e}"))
        })?;

        Ok(Self { key_id, secret })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key_id", &self.key_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}
