use std::collections::BTreeMap;

use http::{HeaderMap, HeaderName, HeaderValue, Method};

use crate::error::SignError;

/// An outbound request as seen by the signer.
///
/// `path` is the raw URL path without scheme, host or query. Path and query
/// values are kept exactly as they will appear on the wire, already
/// percent-encoded; nothing here encodes or decodes them, and `validate`
/// rejects any character the HTTP stack would still rewrite.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: BTreeMap<String, String>,
    body: Vec<u8>,
    content_type: Option<String>,
    headers: HeaderMap,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            body: Vec::new(),
            content_type: None,
            headers: HeaderMap::new(),
        }
    }

    /// Splits `path_and_query` at the first `?` and reads the query string
    /// as raw `name=value` pairs. A name without `=` gets an empty value.
    /// When a name repeats, the first value wins. Any `#fragment` is dropped.
    pub fn parse(method: Method, path_and_query: &str) -> Self {
        let without_fragment = path_and_query
            .split_once('#')
            .map_or(path_and_query, |(before, _)| before);

        let (path, raw_query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_fragment, None),
        };

        let mut descriptor = Self::new(method, path);
        for pair in raw_query.into_iter().flat_map(|q| q.split('&')) {
            if pair.is_empty() {
                continue;
            }
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            descriptor
                .query
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
        descriptor
    }

    /// Sets a query parameter, replacing any previous value for `name`.
    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(name.into(), value.to_string());
        self
    }

    pub fn with_body(mut self, content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.content_type = Some(content_type.into());
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Content type as set by the caller, even when the body is empty.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The query as sent on the wire: `name=value` pairs joined by `&`,
    /// in name order.
    pub fn query_string(&self) -> String {
        crate::encoding::canonical_query(&self.query)
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Rejects descriptors whose fields would make the string to sign
    /// ambiguous or would change on their way to the wire.
    pub fn validate(&self) -> Result<(), SignError> {
        if self.path.is_empty() {
            return Err(SignError::InvalidRequest("path is empty".into()));
        }
        if !self.path.starts_with('/') {
            return Err(SignError::InvalidRequest(format!(
                "path must start with '/': {}",
                self.path
            )));
        }
        if let Some(c) = self.path.chars().find(|&c| !is_path_char(c)) {
            return Err(SignError::InvalidRequest(format!(
                "path must be percent-encoded, found {c:?}: {}",
                self.path
            )));
        }
        if self.path.split('/').any(is_dot_segment) {
            return Err(SignError::InvalidRequest(format!(
                "path must not contain dot segments: {}",
                self.path
            )));
        }

        for (name, value) in &self.query {
            if name.is_empty() {
                return Err(SignError::InvalidRequest("query parameter name is empty".into()));
            }
            if !name.chars().all(is_query_char) {
                return Err(SignError::InvalidRequest(format!(
                    "query parameter name must be percent-encoded: {name:?}"
                )));
            }
            if !value.chars().all(|c| c == '=' || is_query_char(c)) {
                return Err(SignError::InvalidRequest(format!(
                    "query parameter {name} must be percent-encoded: {value:?}"
                )));
            }
        }

        if let Some(content_type) = &self.content_type {
            HeaderValue::from_str(content_type).map_err(|e| {
                SignError::InvalidRequest(format!("content type is not a valid header value: {e}"))
            })?;
        }

        Ok(())
    }
}

// Characters that go on the wire unchanged. Anything else would be
// percent-encoded by the HTTP stack after signing.
const WIRE_SAFE: &str = "-._~!$()*+,;:@/%";

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || WIRE_SAFE.contains(c) || matches!(c, '&' | '=' | '\'')
}

fn is_query_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || WIRE_SAFE.contains(c) || c == '?'
}

// URL parsers collapse these, so the path on the wire would differ.
fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_path_and_query() {
        let descriptor = RequestDescriptor::parse(
            Method::GET,
            "/api/open/devices?test_station_id=67&qrcode=20210901103050484",
        );
        assert_eq!(descriptor.path(), "/api/open/devices");
        assert_eq!(descriptor.query().get("test_station_id").unwrap(), "67");
        assert_eq!(descriptor.query().get("qrcode").unwrap(), "20210901103050484");
    }

    #[test]
    fn parse_keeps_values_encoded() {
        let descriptor = RequestDescriptor::parse(Method::GET, "/search?name=a%20b&tag=x+y");
        assert_eq!(descriptor.query().get("name").unwrap(), "a%20b");
        assert_eq!(descriptor.query().get("tag").unwrap(), "x+y");
    }

    #[test]
    fn parse_first_duplicate_wins() {
        let descriptor = RequestDescriptor::parse(Method::GET, "/p?a=1&a=2");
        assert_eq!(descriptor.query().get("a").unwrap(), "1");
        assert_eq!(descriptor.query().len(), 1);
    }

    #[test]
    fn parse_handles_bare_names_and_empty_pairs() {
        let descriptor = RequestDescriptor::parse(Method::GET, "/p?flag&&b=");
        assert_eq!(descriptor.query().get("flag").unwrap(), "");
        assert_eq!(descriptor.query().get("b").unwrap(), "");
        assert_eq!(descriptor.query().len(), 2);
    }

    #[test]
    fn parse_drops_fragment() {
        let descriptor = RequestDescriptor::parse(Method::GET, "/p?a=1#section");
        assert_eq!(descriptor.path(), "/p");
        assert_eq!(descriptor.query().get("a").unwrap(), "1");
    }

    #[test]
    fn parse_without_query() {
        let descriptor = RequestDescriptor::parse(Method::POST, "/api/open/uploads");
        assert_eq!(descriptor.path(), "/api/open/uploads");
        assert!(descriptor.query().is_empty());
    }

    #[test]
    fn with_body_sets_content_type() {
        let descriptor = RequestDescriptor::new(Method::POST, "/p")
            .with_body("application/json; charset=utf-8", br#"{"a":1}"#.to_vec());
        assert_eq!(descriptor.content_type(), Some("application/json; charset=utf-8"));
        assert_eq!(descriptor.body(), br#"{"a":1}"#);
    }

    #[test]
    fn query_string_is_sorted() {
        let descriptor = RequestDescriptor::new(Method::GET, "/p")
            .with_query("b", 2)
            .with_query("a", 1);
        assert_eq!(descriptor.query_string(), "a=1&b=2");
    }

    #[test]
    fn validate_accepts_plain_request() {
        let descriptor =
            RequestDescriptor::new(Method::GET, "/api/open/devices").with_query("qrcode", "1");
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn validate_accepts_percent_encoded_values() {
        let descriptor = RequestDescriptor::new(
            Method::POST,
            "/api/open/devices/QR%202021%231%20%E6%B5%8B%E8%AF%95/test_data",
        )
        .with_query("qrcode", "QR+2021%231+%E6%B5%8B%E8%AF%95")
        .with_query("filter", "a=b");
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn validate_rejects_characters_the_wire_would_rewrite() {
        for value in ["QR 2021", "QR#1", "\"q\"", "<a>", "测试", "it's"] {
            let descriptor = RequestDescriptor::new(Method::GET, "/p").with_query("qrcode", value);
            assert!(
                matches!(descriptor.validate(), Err(SignError::InvalidRequest(_))),
                "{value:?} should be rejected"
            );
        }
        for path in ["/devices/QR 2021", "/devices/测试", "/a\\b", "/a`b", "/a{b}"] {
            let descriptor = RequestDescriptor::new(Method::GET, path);
            assert!(
                matches!(descriptor.validate(), Err(SignError::InvalidRequest(_))),
                "{path:?} should be rejected"
            );
        }
    }

    #[test]
    fn validate_rejects_dot_segments() {
        for path in ["/api/../devices", "/api/./devices", "/api/%2E%2e/devices"] {
            let descriptor = RequestDescriptor::new(Method::GET, path);
            assert!(descriptor.validate().is_err(), "{path:?} should be rejected");
        }
    }

    #[test]
    fn validate_rejects_relative_path() {
        let descriptor = RequestDescriptor::new(Method::GET, "api/open/devices");
        assert!(matches!(descriptor.validate(), Err(SignError::InvalidRequest(_))));
    }

    #[test]
    fn validate_rejects_empty_path() {
        let descriptor = RequestDescriptor::new(Method::GET, "");
        assert!(matches!(descriptor.validate(), Err(SignError::InvalidRequest(_))));
    }

    #[test]
    fn validate_rejects_embedded_query() {
        let descriptor = RequestDescriptor::new(Method::GET, "/devices?qrcode=1");
        assert!(matches!(descriptor.validate(), Err(SignError::InvalidRequest(_))));
    }

    #[test]
    fn validate_rejects_ambiguous_query() {
        let bad_name = RequestDescriptor::new(Method::GET, "/p").with_query("a=b", "1");
        assert!(bad_name.validate().is_err());

        let bad_value = RequestDescriptor::new(Method::GET, "/p").with_query("a", "1&b=2");
        assert!(bad_value.validate().is_err());

        let empty_name = RequestDescriptor::new(Method::GET, "/p").with_query("", "1");
        assert!(empty_name.validate().is_err());
    }

    #[test]
    fn validate_rejects_multiline_content_type() {
        let descriptor = RequestDescriptor::new(Method::POST, "/p")
            .with_body("text/plain\nX-Injected: 1", b"hi".to_vec());
        assert!(matches!(descriptor.validate(), Err(SignError::InvalidRequest(_))));
    }
}
