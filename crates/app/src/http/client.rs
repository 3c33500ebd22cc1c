//! Base HTTP client.

use std::time::Duration;

use larder::credentials::Credential;
use reqwest::{Client, Method, RequestBuilder, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::errors::{ApiError, extract_error_message};

/// Shared `reqwest` client bound to the shop API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    /// Build a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the TLS backend cannot be initialised.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Start a JSON request, attaching `credential` when given.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        credential: Option<&Credential>,
    ) -> RequestBuilder {
        debug!(%method, path, credential = credential.map(Credential::kind), "api request");

        let request = self
            .http
            .request(method, self.url(path))
            .header(CONTENT_TYPE, "application/json");

        match credential {
            Some(credential) => {
                let (name, value) = credential.header();

                request.header(name, value)
            }
            None => request,
        }
    }

    /// Send and decode a JSON response body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.send(request).await?;

        serde_json::from_str(&body).map_err(ApiError::Decode)
    }

    /// Send, ignoring any response body.
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.send(request).await.map(drop)
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(extract_error_message);

        debug!(status = status.as_u16(), ?message, "api request rejected");

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}
