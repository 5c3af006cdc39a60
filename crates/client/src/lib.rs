pub mod config;
pub mod error;
pub mod multipart;
pub mod sdk;

pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use sdk::{JSON_CONTENT_TYPE, Sdk};
