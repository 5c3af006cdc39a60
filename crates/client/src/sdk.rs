use std::path::Path;
use std::time::Duration;

use http::Method;
use http::header::CONTENT_TYPE;
use mes_signer::{Clock, RequestDescriptor, RequestSigner, SignError, SystemClock};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{info, warn};
use url::form_urlencoded;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::multipart::{MultipartForm, guess_content_type};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the MES open API.
///
/// Every call is signed with the configured app key just before dispatch.
pub struct Sdk<C = SystemClock> {
    http: Client,
    config: ClientConfig,
    signer: RequestSigner<C>,
}

impl Sdk<SystemClock> {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Sdk<C> {
    pub fn with_clock(config: ClientConfig, clock: C) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let signer = RequestSigner::new(config.credential().clone(), clock);
        Ok(Self {
            http,
            config,
            signer,
        })
    }

    fn endpoint_path(&self, endpoint: &str) -> String {
        self.config.endpoint(endpoint).path().to_string()
    }

    /// Looks up the device under test registered with `qrcode` at a test station.
    pub async fn get_devices(
        &self,
        test_station_id: i64,
        qrcode: &str,
    ) -> Result<String, ClientError> {
        let request = RequestDescriptor::new(Method::GET, self.endpoint_path("/devices"))
            .with_query("test_station_id", test_station_id)
            .with_query("qrcode", query_value(qrcode));
        self.send(request).await
    }

    /// Stores test results for the device identified by `qrcode`.
    pub async fn save_test_data<T>(
        &self,
        qrcode: &str,
        test_data: &T,
    ) -> Result<String, ClientError>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(test_data)?;
        let path = self.endpoint_path(&format!("/devices/{}/test_data", path_segment(qrcode)));
        let request = RequestDescriptor::new(Method::POST, path).with_body(JSON_CONTENT_TYPE, body);
        self.send(request).await
    }

    /// Uploads a test image as the `file` field of a multipart form.
    pub async fn upload_image(&self, image_path: impl AsRef<Path>) -> Result<String, ClientError> {
        let image_path = image_path.as_ref();
        let contents = tokio::fs::read(image_path)
            .await
            .map_err(|source| ClientError::Io {
                path: image_path.to_path_buf(),
                source,
            })?;
        let file_name = image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut form = MultipartForm::new();
        form.add_file("file", &file_name, guess_content_type(image_path), &contents);
        let content_type = form.content_type();

        let request = RequestDescriptor::new(Method::POST, self.endpoint_path("/uploads"))
            .with_body(content_type, form.finish());
        self.send(request).await
    }

    /// Heartbeat for an instrument. Sends an empty body.
    pub async fn ping_instrument(&self, instrument_id: i64) -> Result<String, ClientError> {
        let path = self.endpoint_path(&format!("/instruments/{instrument_id}/ping"));
        self.send(RequestDescriptor::new(Method::POST, path)).await
    }

    /// Signs `request` and dispatches it. Returns the response body of a
    /// `200 OK`; any other status is an error carrying the body.
    ///
    /// The descriptor's path and query values must already be
    /// percent-encoded; they are signed and sent as they are.
    pub async fn send(&self, request: RequestDescriptor) -> Result<String, ClientError> {
        let signed = self.signer.sign(request)?;

        let mut url = self.config.base_url().clone();
        url.set_path(signed.path());
        let query = signed.query_string();
        url.set_query((!query.is_empty()).then_some(query.as_str()));
        if url.path() != signed.path() || url.query().unwrap_or_default() != query {
            return Err(SignError::InvalidRequest(format!(
                "signed target {}?{query} would be sent as {}",
                signed.path(),
                &url[url::Position::BeforePath..]
            ))
            .into());
        }

        info!(method = %signed.method(), url = %url, "dispatching signed request");

        let mut builder = self
            .http
            .request(signed.method().clone(), url)
            .headers(signed.headers().clone());
        if !signed.body().is_empty() {
            if let Some(content_type) = signed.content_type() {
                builder = builder.header(CONTENT_TYPE, content_type);
            }
            builder = builder.body(signed.into_body());
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            warn!(%status, "request rejected");
            return Err(ClientError::Status { status, body });
        }

        Ok(body)
    }
}

// Everything but ASCII alphanumerics is escaped, so the segment cannot
// introduce `/`, `?` or `#`.
fn path_segment(raw: &str) -> String {
    utf8_percent_encode(raw, NON_ALPHANUMERIC).to_string()
}

fn query_value(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segment_escapes_reserved_and_non_ascii() {
        assert_eq!(path_segment("20210901103050484"), "20210901103050484");
        assert_eq!(
            path_segment("QR 2021#1 测试"),
            "QR%202021%231%20%E6%B5%8B%E8%AF%95"
        );
        assert_eq!(path_segment("a/b?c"), "a%2Fb%3Fc");
    }

    #[test]
    fn query_value_is_form_encoded() {
        assert_eq!(query_value("20210901103050484"), "20210901103050484");
        assert_eq!(
            query_value("QR 2021#1 测试"),
            "QR+2021%231+%E6%B5%8B%E8%AF%95"
        );
        assert_eq!(query_value("a&b=c"), "a%26b%3Dc");
    }
}
