// Network transport
// The seam between the request pipeline and the wire

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::request::ApiResponse;

/// A fully resolved request, ready to go on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl OutboundRequest {
    /// Value of the `Authorization` header, if any
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION.as_str()))
            .map(|(_, value)| value.as_str())
    }

    /// Token carried in a `Bearer` authorization header
    pub fn bearer_token(&self) -> Option<&str> {
        self.authorization()
            .and_then(|value| value.strip_prefix("Bearer "))
    }
}

/// No response was received
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct TransportError {
    /// Coarse category (`timeout`, `connection_failed`, ...)
    pub kind: &'static str,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Sends a request and buffers the response.
///
/// Implementations return `Ok` for every HTTP status; only the absence of a
/// response is an error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: OutboundRequest) -> Result<ApiResponse, TransportError>;
}

/// Production transport on a pooled `reqwest` client
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with connection pooling and timeouts
    pub fn new(
        max_connections: usize,
        connect_timeout: u64,
        request_timeout: u64,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .pool_max_idle_per_host(max_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .map_err(|e| {
                TransportError::new("client_build", format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    fn build(&self, request: &OutboundRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header(reqwest::header::ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::new("request_error", format!("Invalid header name {}: {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                TransportError::new("request_error", format!("Invalid header value: {}", e))
            })?;
            builder = builder.header(name, value);
        }

        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        Ok(builder)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<ApiResponse, TransportError> {
        let builder = self.build(&request)?;

        let response = builder.send().await.map_err(|e| {
            let kind = error_kind(&e);
            tracing::warn!(
                error_kind = kind,
                error = %e,
                url = %request.url,
                "HTTP request error"
            );
            TransportError::new(kind, e.to_string())
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            tracing::warn!(
                status = %status,
                error = %e,
                url = %request.url,
                "Failed to read response body"
            );
            TransportError::new(error_kind(&e), e.to_string())
        })?;

        Ok(ApiResponse::new(status, headers, body))
    }
}

/// Categorize a reqwest error for logs
fn error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection_failed"
    } else if e.is_request() {
        "request_error"
    } else if e.is_body() {
        "body_error"
    } else if e.is_decode() {
        "decode_error"
    } else {
        "unknown"
    }
}
