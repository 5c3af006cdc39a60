use std::collections::BTreeMap;

use crate::request::RequestDescriptor;

use super::digest::body_digest;

/// Joins query parameters as `name=value` with `&`, in byte order of name.
///
/// Values are used verbatim.
pub fn canonical_query(query: &BTreeMap<String, String>) -> String {
    query
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// The timestamp-independent part of the string to sign.
///
/// Line layout of the signed string:
///
/// ```text
/// METHOD
/// PATH
/// CANONICAL_QUERY
/// CONTENT_TYPE      (empty when the body is empty)
/// BODY_MD5_BASE64   (empty when the body is empty)
/// TIMESTAMP_MILLIS
/// SECRET
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub content_type: String,
    pub content_md5: String,
}

impl CanonicalRequest {
    pub fn new(request: &RequestDescriptor) -> Self {
        let (content_type, content_md5) = if request.body().is_empty() {
            (String::new(), String::new())
        } else {
            (
                request.content_type().unwrap_or_default().to_string(),
                body_digest(request.body()),
            )
        };

        Self {
            method: request.method().as_str().to_string(),
            path: request.path().to_string(),
            query: canonical_query(request.query()),
            content_type,
            content_md5,
        }
    }

    pub fn string_to_sign(&self, timestamp: u64, secret: &str) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n{}",
            self.method,
            self.path,
            self.query,
            self.content_type,
            self.content_md5,
            timestamp,
            secret
        )
    }
}
