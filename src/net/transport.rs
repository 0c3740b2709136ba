//! HTTP transport seam.
//!
//! [`ApiClient`](super::api::ApiClient) prepares fully-formed requests and
//! hands them to a [`Transport`]. Production code uses [`HttpTransport`]
//! (reqwest); tests substitute an in-memory fake.

use async_trait::async_trait;
use reqwest::Method;

use super::error::ApiError;
use crate::config::Timeouts;

/// A request with URL, headers, and body already resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    /// Absolute URL including any query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl PreparedRequest {
    /// First header value matching `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and raw body of a completed exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends prepared requests. Enables mocking in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one HTTP exchange.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] when no response was received. Non-2xx
    /// statuses are not errors at this layer.
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, ApiError>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the reqwest client cannot be built.
    pub fn new(timeouts: Timeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request())
            .connect_timeout(timeouts.connect())
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, ApiError> {
        let mut builder = self.http.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(RawResponse { status, body })
    }
}
