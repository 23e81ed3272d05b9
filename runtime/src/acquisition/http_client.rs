//! Async HTTP client wrapping reqwest.
//!
//! Not a browser: plain JSON requests against the store APIs. One attempt
//! per call, no retries; the caller decides what a failure means.

use crate::error::KatsiniResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Response from an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// HTTP client for the API-backed providers.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("katsini/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// GET `url` with query parameters and extra headers.
    pub async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> KatsiniResult<HttpResponse> {
        let mut builder = self.client.get(url).query(query);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        Self::read(builder).await
    }

    /// POST `body` as JSON.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> KatsiniResult<HttpResponse> {
        Self::read(self.client.post(url).json(body)).await
    }

    async fn read(builder: reqwest::RequestBuilder) -> KatsiniResult<HttpResponse> {
        let r = builder.send().await?;
        let status = r.status().as_u16();
        debug!(url = %r.url(), status, "http response");
        let body = r.text().await?;
        Ok(HttpResponse { status, body })
    }
}
