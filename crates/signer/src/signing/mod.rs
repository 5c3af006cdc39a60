mod hmac_sha1;
mod signer;

pub use hmac_sha1::hmac_sha1_base64;
pub use signer::{
    HEADER_APP_KEY, HEADER_SIGNATURE, HEADER_TIMESTAMP, RequestSigner, Signature, compute_signature,
    sign,
};
