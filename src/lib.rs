// Storefront Gateway - authenticated client for the storefront backend

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod queue;
pub mod request;
pub mod transport;

pub use auth::{CredentialStore, SessionEvent};
pub use error::{ApiError, RefreshError};
pub use http_client::{AuthClient, PipelineConfig};
pub use request::{ApiResponse, RequestDescriptor};
