//! In-memory `multipart/form-data` bodies.
//!
//! The body has to exist as bytes before dispatch so its MD5 can go into
//! the signature, which rules out streaming form builders.

use std::path::Path;

pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    /// A form with a random 32-hex-digit boundary.
    pub fn new() -> Self {
        Self::with_boundary(hex::encode(rand::random::<[u8; 16]>()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn add_file(&mut self, field: &str, file_name: &str, content_type: &str, contents: &[u8]) {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape_quotes(field),
                escape_quotes(file_name)
            )
            .as_bytes(),
        );
        self.body
            .extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        self.body.extend_from_slice(contents);
        self.body.extend_from_slice(b"\r\n");
    }

    /// Appends the closing delimiter and returns the body.
    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Media type for an uploaded file, from its extension.
pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_body_layout() {
        let mut form = MultipartForm::with_boundary("xyz");
        form.add_file("file", "baidu.png", "image/png", b"PNG");
        assert_eq!(form.content_type(), "multipart/form-data; boundary=xyz");
        assert_eq!(
            form.finish(),
            b"--xyz\r\n\
              Content-Disposition: form-data; name=\"file\"; filename=\"baidu.png\"\r\n\
              Content-Type: image/png\r\n\
              \r\n\
              PNG\r\n\
              --xyz--\r\n"
                .to_vec()
        );
    }

    #[test]
    fn random_boundaries_differ() {
        let a = MultipartForm::new();
        let b = MultipartForm::new();
        assert_eq!(a.boundary().len(), 32);
        assert_ne!(a.boundary(), b.boundary());
    }

    #[test]
    fn quotes_in_file_name_are_escaped() {
        let mut form = MultipartForm::with_boundary("b");
        form.add_file("file", "a\"b.png", "image/png", b"");
        let body = String::from_utf8(form.finish()).unwrap();
        assert!(body.contains("filename=\"a\\\"b.png\""));
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(guess_content_type(Path::new("baidu.png")), "image/png");
        assert_eq!(guess_content_type(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(guess_content_type(Path::new("data.bin")), "application/octet-stream");
        assert_eq!(guess_content_type(Path::new("noext")), "application/octet-stream");
    }
}
