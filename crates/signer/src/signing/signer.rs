use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::clock::Clock;
use crate::credential::Credential;
use crate::encoding::CanonicalRequest;
use crate::error::SignError;
use crate::request::RequestDescriptor;

use super::hmac_sha1::hmac_sha1_base64;

pub const HEADER_APP_KEY: HeaderName = HeaderName::from_static("x-appkey");
pub const HEADER_TIMESTAMP: HeaderName = HeaderName::from_static("x-timestamp");
pub const HEADER_SIGNATURE: HeaderName = HeaderName::from_static("x-signature");

/// The three values a signed request carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub key_id: String,
    pub timestamp: u64,
    pub value: String,
}

impl Signature {
    /// Inserts `X-AppKey`, `X-Timestamp` and `X-Signature`, replacing any
    /// existing values under those names.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), SignError> {
        headers.insert(HEADER_APP_KEY, header_value(&self.key_id)?);
        headers.insert(HEADER_TIMESTAMP, HeaderValue::from(self.timestamp));
        headers.insert(HEADER_SIGNATURE, header_value(&self.value)?);
        Ok(())
    }
}

fn header_value(value: &str) -> Result<HeaderValue, SignError> {
    HeaderValue::from_str(value)
        .map_err(|e| SignError::InvalidCredential(format!("not a valid header value: {e}")))
}

/// Signs `request` as of `timestamp`.
///
/// The HMAC key is the key id; the secret is the last line of the signed
/// string. The MES platform verifies exactly this construction.
pub fn compute_signature(
    request: &RequestDescriptor,
    credential: &Credential,
    timestamp: u64,
) -> Result<Signature, SignError> {
    request.validate()?;

    let string_to_sign =
        CanonicalRequest::new(request).string_to_sign(timestamp, credential.secret());
    let value = hmac_sha1_base64(credential.key_id().as_bytes(), string_to_sign.as_bytes())?;

    debug!(
        method = %request.method(),
        path = request.path(),
        key_id = credential.key_id(),
        timestamp,
        "signed request"
    );

    Ok(Signature {
        key_id: credential.key_id().to_string(),
        timestamp,
        value,
    })
}

/// Reads `clock` once and returns `request` with the signature headers added.
pub fn sign(
    mut request: RequestDescriptor,
    credential: &Credential,
    clock: &impl Clock,
) -> Result<RequestDescriptor, SignError> {
    let timestamp = clock.now_millis();
    let signature = compute_signature(&request, credential, timestamp)?;
    signature.apply(request.headers_mut())?;
    Ok(request)
}

/// A credential bound to a clock.
///
/// Holds no mutable state; share it freely between tasks.
#[derive(Debug, Clone)]
pub struct RequestSigner<C> {
    credential: Credential,
    clock: C,
}

impl<C: Clock> RequestSigner<C> {
    pub fn new(credential: Credential, clock: C) -> Self {
        Self { credential, clock }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn sign(&self, request: RequestDescriptor) -> Result<RequestDescriptor, SignError> {
        sign(request, &self.credential, &self.clock)
    }
}
