pub mod clock;
pub mod credential;
pub mod encoding;
pub mod error;
pub mod request;
pub mod signing;

pub use clock::{Clock, FixedClock, SystemClock};
pub use credential::Credential;
pub use encoding::{CanonicalRequest, body_digest, canonical_query};
pub use error::SignError;
pub use request::RequestDescriptor;
pub use signing::{
    HEADER_APP_KEY, HEADER_SIGNATURE, HEADER_TIMESTAMP, RequestSigner, Signature, compute_signature,
    sign,
};
