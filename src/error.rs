// Error handling module
// Defines the error taxonomy surfaced by the request pipeline

use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::request::ApiResponse;

/// Message delivered to callers when no response was received at all
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

/// Errors surfaced to callers of the authenticated client
#[derive(Error, Debug)]
pub enum ApiError {
    /// No response received (connect failure, timeout, broken connection)
    #[error("Network error. Please check your connection.")]
    Network { kind: &'static str, detail: String },

    /// 401 on a request that was already replayed once, or that opted out of auth
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Token refresh failed; terminal for the whole refresh episode
    #[error("Token refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    /// Any other non-2xx response, passed through unchanged
    #[error("HTTP error: {status} - {message}")]
    Http {
        status: u16,
        message: String,
        response: Box<ApiResponse>,
    },

    /// Too many requests parked behind one refresh
    #[error("Refresh queue is full ({limit} requests already waiting)")]
    QueueFull { limit: usize },

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Credential storage failure
    #[error("Credential storage error: {0}")]
    Storage(#[from] StorageError),

    /// Request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Stable snake_case tag for this error
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Network { .. } => "network_error",
            ApiError::Unauthorized { .. } => "unauthorized",
            ApiError::Refresh(_) => "refresh_failed",
            ApiError::Http { .. } => "http_error",
            ApiError::QueueFull { .. } => "queue_full",
            ApiError::Decode(_) => "decode_error",
            ApiError::Storage(_) => "storage_error",
            ApiError::InvalidRequest(_) => "invalid_request",
        }
    }

    /// HTTP status carried by this error, if the backend produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Refresh(RefreshError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// The backend response behind an `Http` error
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            ApiError::Http { response, .. } => Some(response.as_ref()),
            _ => None,
        }
    }

    /// JSON shape handed to presentation layers: `{ "type": ..., "message": ... }`
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "type": self.kind(),
            "message": self.to_string(),
        });
        if let Some(status) = self.status() {
            body["status"] = json!(status);
        }
        body
    }
}

/// Why a refresh episode ended without a new token
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RefreshError {
    /// No refresh token stored, nothing to exchange
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// Refresh endpoint unreachable
    #[error("refresh request failed: {0}")]
    Network(String),

    /// Refresh endpoint answered with a non-2xx status
    #[error("refresh rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// Refresh endpoint answered 2xx with an unusable body
    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    /// Refresh endpoint did not answer in time
    #[error("refresh timed out after {0:?}")]
    TimedOut(Duration),

    /// New tokens could not be persisted
    #[error("could not persist refreshed tokens: {0}")]
    Storage(String),

    /// The refresh task ended without settling the episode
    #[error("refresh abandoned before completion")]
    Abandoned,
}

/// Credential storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
