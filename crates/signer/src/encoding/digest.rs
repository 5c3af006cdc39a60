use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Base64 of the MD5 digest of `body`, or the empty string for an empty body.
pub fn body_digest(body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }
    let digest = md5::compute(body);
    STANDARD.encode(digest.0)
}
