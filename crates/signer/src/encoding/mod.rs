mod canonical;
mod digest;

pub use canonical::{CanonicalRequest, canonical_query};
pub use digest::body_digest;
