use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::auth::{
    exchange_refresh_token, token_preview, Admission, CredentialStore, EpisodeGuard,
    RefreshCoordinator, SessionEvent, TokenPair,
};
use crate::error::{ApiError, RefreshError};
use crate::queue::{WaitError, Waiter};
use crate::request::{ApiResponse, RequestDescriptor};
use crate::transport::{OutboundRequest, Transport};

pub const DEFAULT_REFRESH_PATH: &str = "/user/auth/refresh";
pub const DEFAULT_SIGN_IN_PATH: &str = "/auth";
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_PENDING_WAITERS: usize = 1024;

/// Settings for one authenticated client
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Prefix for relative descriptor URLs
    pub base_url: String,

    /// Refresh endpoint, relative to `base_url`
    pub refresh_path: String,

    /// Reported in [`SessionEvent::Expired`]
    pub sign_in_path: String,

    /// Upper bound on one refresh exchange
    pub refresh_timeout: Duration,

    /// Maximum number of requests parked behind one refresh
    pub max_pending_waiters: usize,
}

impl PipelineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            refresh_timeout: Duration::from_secs(DEFAULT_REFRESH_TIMEOUT_SECS),
            max_pending_waiters: DEFAULT_MAX_PENDING_WAITERS,
        }
    }
}

/// HTTP client for the storefront backend with transparent token refresh.
///
/// Every request gets the stored access token attached at send time. A 401
/// triggers at most one refresh per expiry episode: the first failing request
/// performs the exchange, concurrent failures park until it settles, and all
/// of them are replayed once with the new token.
///
/// Cloning is cheap and clones share credentials and refresh state.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    credentials: CredentialStore,
    coordinator: Arc<RefreshCoordinator>,
    config: PipelineConfig,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthClient {
    /// Create a new client
    pub fn new(
        config: PipelineConfig,
        transport: Arc<dyn Transport>,
        credentials: CredentialStore,
    ) -> Self {
        let (events, _) = broadcast::channel(16);

        Self {
            inner: Arc::new(Inner {
                transport,
                credentials,
                coordinator: Arc::new(RefreshCoordinator::new(config.max_pending_waiters)),
                config,
                events,
            }),
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Whether a refresh exchange is currently running
    pub fn is_refreshing(&self) -> bool {
        self.inner.coordinator.is_refreshing()
    }

    /// Number of requests parked behind the running refresh
    pub fn pending_waiters(&self) -> usize {
        self.inner.coordinator.pending_waiters()
    }

    /// Resolve a descriptor URL against the base URL
    pub fn resolve_url(&self, url: &str) -> String {
        join_url(&self.inner.config.base_url, url)
    }

    /// Execute a request through the authentication pipeline
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<ApiResponse, ApiError> {
        tracing::debug!(
            method = %descriptor.method(),
            url = %descriptor.url(),
            skip_auth = descriptor.skips_auth(),
            "Sending HTTP request"
        );

        let token = if descriptor.skips_auth() {
            None
        } else {
            self.inner.credentials.access_token()?
        };

        let response = self.transmit(&descriptor, token.as_deref()).await?;
        if response.status() != reqwest::StatusCode::UNAUTHORIZED {
            return finish(&descriptor, response);
        }

        // No credential went out, or this is already the replay
        if descriptor.skips_auth() || descriptor.is_retried() {
            return Err(unauthorized(&descriptor, &response));
        }

        tracing::warn!(url = %descriptor.url(), "Received 401, recovering credentials");
        let replay = descriptor.as_retried();
        let fresh = self.recover(token.as_deref()).await?;

        let response = self.transmit(&replay, Some(&fresh)).await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(unauthorized(&replay, &response));
        }
        finish(&replay, response)
    }

    /// GET and decode the JSON body
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        self.send(RequestDescriptor::get(url)).await?.json()
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post<T, B>(&self, url: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(RequestDescriptor::post(url).with_json(body)?)
            .await?
            .json()
    }

    /// PUT a JSON body and decode the JSON response
    pub async fn put<T, B>(&self, url: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(RequestDescriptor::put(url).with_json(body)?)
            .await?
            .json()
    }

    /// PATCH a JSON body and decode the JSON response
    pub async fn patch<T, B>(&self, url: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(RequestDescriptor::patch(url).with_json(body)?)
            .await?
            .json()
    }

    /// DELETE and decode the JSON response
    pub async fn delete<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        self.send(RequestDescriptor::delete(url)).await?.json()
    }

    /// Put one attempt on the wire with `token` as bearer credential
    async fn transmit(
        &self,
        descriptor: &RequestDescriptor,
        token: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        descriptor.validate_headers()?;
        let url = self.resolve_url(descriptor.url());

        let mut headers: Vec<(String, String)> = descriptor
            .headers()
            .iter()
            .filter(|(name, _)| {
                let is_auth = name.eq_ignore_ascii_case("authorization");
                !(is_auth && (descriptor.skips_auth() || token.is_some()))
            })
            .cloned()
            .collect();

        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        let request = OutboundRequest {
            method: descriptor.method().clone(),
            url,
            query: descriptor.query().to_vec(),
            headers,
            body: descriptor.body().cloned(),
        };

        self.inner.transport.execute(request).await.map_err(|e| {
            tracing::error!(
                error_kind = e.kind,
                error = %e.message,
                url = %descriptor.url(),
                "HTTP request failed without a response"
            );
            ApiError::Network {
                kind: e.kind,
                detail: e.message,
            }
        })
    }

    /// Obtain a token to replay with after a 401 on a request sent with `sent_with`
    async fn recover(&self, sent_with: Option<&str>) -> Result<String, ApiError> {
        let credentials = &self.inner.credentials;
        let admission = self.inner.coordinator.admit(|| {
            let current = credentials.access_token()?;
            Ok(current.filter(|token| Some(token.as_str()) != sent_with))
        })?;

        match admission {
            Admission::Replay(token) => {
                tracing::debug!(
                    token = %token_preview(&token),
                    "Token already rotated, replaying without refresh"
                );
                Ok(token)
            }
            Admission::Wait(waiter) => {
                tracing::debug!("Refresh in progress, waiting for new token");
                wait_for_refresh(waiter).await
            }
            Admission::Lead { guard, outcome } => {
                // The exchange outlives the request that started it
                let client = self.clone();
                tokio::spawn(async move { client.run_refresh(guard).await });
                wait_for_refresh(outcome).await
            }
        }
    }

    /// Perform one refresh exchange and settle the episode
    async fn run_refresh(self, guard: EpisodeGuard) {
        match self.refresh_pair().await {
            Ok(pair) => {
                let released = guard.resolve(&pair.access_token);
                tracing::info!(
                    released = released,
                    "Refresh complete, replaying parked requests"
                );
            }
            Err(error) => {
                // Wipe first so late 401s see a signed-out store
                if let Err(e) = self.inner.credentials.clear() {
                    tracing::error!("Failed to clear stored credentials: {}", e);
                }

                // Published before any caller sees the error. No subscriber is not an error.
                let _ = self.inner.events.send(SessionEvent::Expired {
                    sign_in_path: self.inner.config.sign_in_path.clone(),
                    reason: error.to_string(),
                });

                let released = guard.reject(error.clone());
                tracing::error!(
                    error = %error,
                    released = released,
                    "Token refresh failed, session expired"
                );
            }
        }
    }

    /// Exchange the stored refresh token and persist the new pair
    async fn refresh_pair(&self) -> Result<TokenPair, RefreshError> {
        let refresh_token = self
            .inner
            .credentials
            .refresh_token()
            .map_err(|e| RefreshError::Storage(e.to_string()))?
            .ok_or(RefreshError::MissingRefreshToken)?;

        let url = self.resolve_url(&self.inner.config.refresh_path);
        let pair = exchange_refresh_token(
            self.inner.transport.as_ref(),
            &url,
            &refresh_token,
            self.inner.config.refresh_timeout,
        )
        .await?;

        self.inner
            .credentials
            .store_pair(&pair)
            .map_err(|e| RefreshError::Storage(e.to_string()))?;

        Ok(pair)
    }
}

async fn wait_for_refresh(waiter: Waiter<String, RefreshError>) -> Result<String, ApiError> {
    waiter.await.map_err(|e| match e {
        WaitError::Rejected(error) => ApiError::Refresh(error),
        WaitError::Dropped => ApiError::Refresh(RefreshError::Abandoned),
    })
}

/// Map a non-401 response to the caller's result
fn finish(descriptor: &RequestDescriptor, response: ApiResponse) -> Result<ApiResponse, ApiError> {
    let status = response.status();
    if status.is_success() {
        tracing::debug!(status = %status, "Request successful");
        return Ok(response);
    }

    let message = response.error_message();
    tracing::error!(
        status = status.as_u16(),
        url = %descriptor.url(),
        response_body = %message,
        "HTTP request failed with error response"
    );
    Err(ApiError::Http {
        status: status.as_u16(),
        message,
        response: Box::new(response),
    })
}

fn unauthorized(descriptor: &RequestDescriptor, response: &ApiResponse) -> ApiError {
    let message = response.error_message();
    tracing::warn!(
        url = %descriptor.url(),
        retried = descriptor.is_retried(),
        "Request unauthorized"
    );
    ApiError::Unauthorized { message }
}

/// Join `url` onto `base` unless it is already absolute
fn join_url(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    if url.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}
