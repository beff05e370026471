// Token refresh exchange

use reqwest::Method;
use std::time::Duration;

use super::types::{token_preview, TokenPair};
use crate::error::RefreshError;
use crate::models::{GenericResponse, RefreshRequest, RefreshedTokens};
use crate::transport::{OutboundRequest, Transport};

/// Exchange `refresh_token` for a new token pair.
///
/// The request never carries an access token. The whole exchange, body read
/// included, is bounded by `timeout`.
pub(crate) async fn exchange_refresh_token(
    transport: &dyn Transport,
    url: &str,
    refresh_token: &str,
    timeout: Duration,
) -> Result<TokenPair, RefreshError> {
    tracing::info!(url = %url, "Refreshing access token...");

    let body = serde_json::to_value(RefreshRequest {
        refresh_token: refresh_token.to_string(),
    })
    .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

    let request = OutboundRequest {
        method: Method::POST,
        url: url.to_string(),
        query: Vec::new(),
        headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        body: Some(body),
    };

    let response = tokio::time::timeout(timeout, transport.execute(request))
        .await
        .map_err(|_| RefreshError::TimedOut(timeout))?
        .map_err(|e| RefreshError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let message = response.error_message();
        tracing::error!(
            status = status.as_u16(),
            body = %message,
            "Token refresh rejected"
        );
        return Err(RefreshError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    let data: GenericResponse<RefreshedTokens> = response
        .json()
        .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

    if data.data.access_token.is_empty() {
        return Err(RefreshError::InvalidResponse(
            "Refresh response does not contain accessToken".to_string(),
        ));
    }

    tracing::info!(
        token = %token_preview(&data.data.access_token),
        "Access token refreshed"
    );

    Ok(TokenPair {
        access_token: data.data.access_token,
        refresh_token: data.data.refresh_token,
    })
}
