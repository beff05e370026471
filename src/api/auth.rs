// Sign-in, sign-up, profile and sign-out

use serde::Serialize;
use serde_json::Value;

use super::{PROFILE_PATH, SIGN_IN_PATH, SIGN_UP_PATH};
use crate::auth::TokenPair;
use crate::error::ApiError;
use crate::http_client::AuthClient;
use crate::models::{GenericResponse, SignInData, SignInRequest, UserProfile};
use crate::request::RequestDescriptor;

/// Sign in and persist the issued token(s). Returns the access token.
pub async fn sign_in(client: &AuthClient, credentials: &SignInRequest) -> Result<String, ApiError> {
    let descriptor = RequestDescriptor::post(SIGN_IN_PATH)
        .with_json(credentials)?
        .without_auth();

    let response: GenericResponse<SignInData> = client.send(descriptor).await?.json()?;
    let data = response.data;

    if data.token.is_empty() {
        return Err(ApiError::Decode(
            "Sign-in response does not contain a token".to_string(),
        ));
    }

    match data.refresh_token {
        Some(refresh_token) => client.credentials().store_pair(&TokenPair {
            access_token: data.token.clone(),
            refresh_token,
        })?,
        None => client.credentials().set_access_token(&data.token)?,
    }

    tracing::info!(username = %credentials.username, "Signed in");
    Ok(data.token)
}

/// Register a new account; the backend answers with a message in `data`
pub async fn sign_up<B: Serialize + ?Sized>(client: &AuthClient, body: &B) -> Result<Value, ApiError> {
    let descriptor = RequestDescriptor::post(SIGN_UP_PATH)
        .with_json(body)?
        .without_auth();

    let response: GenericResponse<Value> = client.send(descriptor).await?.json()?;
    Ok(response.data)
}

/// Fetch the signed-in user's profile
pub async fn my_profile(client: &AuthClient) -> Result<UserProfile, ApiError> {
    client.send(RequestDescriptor::get(PROFILE_PATH)).await?.data()
}

/// Sign in, then load the profile with the new token
pub async fn sign_in_with_profile(
    client: &AuthClient,
    credentials: &SignInRequest,
) -> Result<UserProfile, ApiError> {
    sign_in(client, credentials).await?;
    my_profile(client).await
}

/// Forget the stored credentials
pub fn sign_out(client: &AuthClient) -> Result<(), ApiError> {
    client.credentials().clear()?;
    tracing::info!("Signed out");
    Ok(())
}
