// Request descriptors and buffered responses

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::models::{ExceptionBody, MaybeWrapped};

/// Everything needed to issue one outbound request, independent of transport.
///
/// Descriptors are values: builder methods consume and return `self`, and the
/// replay marker is set with [`RequestDescriptor::as_retried`], which returns a
/// modified copy. A descriptor can be cloned and logged freely.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    headers: Vec<(String, String)>,
    skip_auth: bool,
    retried: bool,
}

impl RequestDescriptor {
    /// Create a descriptor for `url`, absolute or relative to the client's base URL
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
            skip_auth: false,
            retried: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Attach a JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` and attach it as JSON
    pub fn with_json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize body: {}", e)))?;
        Ok(self.with_body(value))
    }

    /// Add a header override
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Opt out of credential attachment
    pub fn without_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    /// Copy of this descriptor with the replay marker set
    pub fn as_retried(&self) -> Self {
        Self {
            retried: true,
            ..self.clone()
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn skips_auth(&self) -> bool {
        self.skip_auth
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Check every header override is a legal HTTP header
    pub fn validate_headers(&self) -> Result<(), ApiError> {
        for (name, value) in &self.headers {
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ApiError::InvalidRequest(format!("Invalid header name {:?}: {}", name, e))
            })?;
            HeaderValue::from_str(value).map_err(|e| {
                ApiError::InvalidRequest(format!("Invalid value for header {}: {}", name, e))
            })?;
        }
        Ok(())
    }
}

/// Fully buffered HTTP response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Response with a JSON body and no headers
    pub fn from_json(status: StatusCode, body: &Value) -> Self {
        Self::new(status, HeaderMap::new(), Bytes::from(body.to_string()))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, lossily decoded
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ApiError::Decode(format!(
                "Failed to parse response body (status {}): {}",
                self.status, e
            ))
        })
    }

    /// Decode a body that may or may not be wrapped in `{ "data": ... }`
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        self.json::<MaybeWrapped<T>>().map(MaybeWrapped::into_inner)
    }

    /// `code` field of a backend `{ message, code }` body
    pub fn error_code(&self) -> Option<u16> {
        serde_json::from_slice::<ExceptionBody>(&self.body)
            .ok()
            .and_then(|exception| exception.code)
    }

    /// Best-effort error message: backend `{ message, code }` body, else raw text
    pub fn error_message(&self) -> String {
        match serde_json::from_slice::<ExceptionBody>(&self.body) {
            Ok(exception) if !exception.message.is_empty() => exception.message,
            _ => {
                let text = self.text();
                if text.is_empty() {
                    self.status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                } else {
                    text
                }
            }
        }
    }
}
