use anyhow::{Context, Result};
use dialoguer::Password;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use storefront_gateway::api;
use storefront_gateway::auth::{CredentialStore, SessionEvent, SqliteStorage};
use storefront_gateway::config::{Command, Config};
use storefront_gateway::http_client::AuthClient;
use storefront_gateway::models::{PageRequest, SignInRequest};
use storefront_gateway::transport::ReqwestTransport;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let (config, command) = Config::load()?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Backend: {}", config.base_url);
    tracing::debug!("Credential store: {}", config.credentials_db.display());

    let storage = SqliteStorage::open(&config.credentials_db).with_context(|| {
        format!(
            "Failed to open credential store: {}",
            config.credentials_db.display()
        )
    })?;
    let credentials = CredentialStore::new(Arc::new(storage));

    let transport = ReqwestTransport::new(
        config.http_max_connections,
        config.http_connect_timeout,
        config.http_request_timeout,
    )?;

    let client = AuthClient::new(config.pipeline_config(), Arc::new(transport), credentials);
    let mut events = client.subscribe();

    let result = run(&client, command).await;
    for notice in session_notices(&mut events) {
        eprintln!("{}", notice);
    }
    result
}

/// Execute one CLI command
async fn run(client: &AuthClient, command: Command) -> Result<()> {
    match command {
        Command::SignIn { username } => {
            let password = Password::new()
                .with_prompt(format!("Password for {}", username))
                .interact()
                .context("Failed to read password")?;

            let profile = api::auth::sign_in_with_profile(
                client,
                &SignInRequest { username, password },
            )
            .await?;
            tracing::info!("✅ Signed in as {}", profile.name);
            print_json(&profile)
        }
        Command::SignOut => {
            api::auth::sign_out(client)?;
            tracing::info!("👋 Signed out");
            Ok(())
        }
        Command::Me => print_json(&api::auth::my_profile(client).await?),
        Command::Products { page, size } => {
            let products = api::products::list_products(client, PageRequest::new(page, size)).await?;
            print_json(&products)
        }
        Command::Orders { page, size } => {
            let orders = api::orders::list_orders(client, PageRequest::new(page, size)).await?;
            print_json(&orders)
        }
        Command::DeleteProduct { id } => {
            api::products::delete_product(client, &id).await?;
            tracing::info!("✅ Deleted product {}", id);
            Ok(())
        }
    }
}

/// Messages for session events published while a command ran
fn session_notices(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<String> {
    let mut notices = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::Expired {
                sign_in_path,
                reason,
            } => {
                tracing::warn!(reason = %reason, "Session expired");
                notices.push(format!(
                    "Session expired ({}). Sign in again: storefront sign-in <username>  [{}]",
                    reason, sign_in_path
                ));
            }
        }
    }
    notices
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_notices_drain_expiry_events() {
        let (tx, mut rx) = broadcast::channel(4);
        tx.send(SessionEvent::Expired {
            sign_in_path: "/auth".to_string(),
            reason: "refresh rejected: 500 - down".to_string(),
        })
        .unwrap();

        let notices = session_notices(&mut rx);

        assert_eq!(notices.len(), 1);
        assert!(notices[0].contains("refresh rejected: 500 - down"));
        assert!(notices[0].contains("/auth"));
        assert!(session_notices(&mut rx).is_empty());
    }
}
