use mes_signer::Credential;
use url::Url;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api/open";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    credential: Credential,
}

impl ClientConfig {
    /// `base_url` is the API root, e.g. `http://127.0.0.1:8080/api/open`.
    /// A trailing slash is ignored.
    pub fn new(base_url: &str, credential: Credential) -> Result<Self, ClientError> {
        let mut url =
            Url::parse(base_url).map_err(|e| ClientError::BaseUrl(format!("{base_url}: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::BaseUrl(format!(
                "{base_url}: scheme must be http or https"
            )));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ClientError::BaseUrl(format!(
                "{base_url}: must not carry a query or fragment"
            )));
        }

        let trimmed = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed);

        Ok(Self {
            base_url: url,
            credential,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Absolute URL for `endpoint` below the API root, with the path in the
    /// percent-encoded form that goes on the wire.
    pub fn endpoint(&self, endpoint: &str) -> Url {
        let mut url = self.base_url.clone();
        let root = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{root}{endpoint}"));
        url
    }
}
