#[derive(Debug, thiserror::Error)]
pub enum SignError {
    /// A digest or MAC primitive could not be constructed.
    #[error("Signing primitive unavailable: {0}")]
    Configuration(String),
    #[error("Invalid request descriptor: {0}")]
    InvalidRequest(String),
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
}

impl SignError {
    /// Configuration failures mean the process is set up wrong and every
    /// subsequent signature would fail the same way.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SignError::Configuration(_))
    }
}
