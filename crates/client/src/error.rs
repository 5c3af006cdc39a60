use std::path::PathBuf;

use mes_signer::SignError;
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to sign request: {0}")]
    Sign(#[from] SignError),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("[Err] status code: {status}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize request body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid base URL: {0}")]
    BaseUrl(String),
}
