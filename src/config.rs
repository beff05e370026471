use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::http_client::{
    PipelineConfig, DEFAULT_MAX_PENDING_WAITERS, DEFAULT_REFRESH_PATH,
    DEFAULT_REFRESH_TIMEOUT_SECS, DEFAULT_SIGN_IN_PATH,
};

/// Storefront CLI - authenticated client for the storefront backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Backend base URL
    #[arg(short = 'u', long, env = "STOREFRONT_API_BASE_URL")]
    pub base_url: Option<String>,

    /// Path to the credential SQLite database
    #[arg(short = 'd', long, env = "STOREFRONT_CREDENTIALS_DB")]
    pub db_file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "60")]
    pub http_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sign in and store the issued tokens
    SignIn {
        username: String,
    },

    /// Forget stored tokens
    SignOut,

    /// Show the signed-in user's profile
    Me,

    /// List products
    Products {
        #[arg(long, default_value = "0")]
        page: u32,
        #[arg(long, default_value = "10")]
        size: u32,
    },

    /// List orders
    Orders {
        #[arg(long, default_value = "0")]
        page: u32,
        #[arg(long, default_value = "10")]
        size: u32,
    },

    /// Delete a product by id
    DeleteProduct {
        id: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    // Backend
    pub base_url: String,
    pub refresh_path: String,
    pub sign_in_path: String,

    // Credentials
    pub credentials_db: PathBuf,

    // HTTP client
    pub http_max_connections: usize,
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    // Refresh episode bounds
    pub refresh_timeout: u64,
    pub max_pending_waiters: usize,

    // Logging
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > defaults
    pub fn load() -> Result<(Self, Command)> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        let command = args.command.clone();
        Ok((Self::from_args(args)?, command))
    }

    /// Build configuration from parsed arguments; remaining settings come from ENV
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Config {
            base_url: args
                .base_url
                .or_else(|| std::env::var("STOREFRONT_API_BASE_URL").ok())
                .context(
                    "STOREFRONT_API_BASE_URL is required (use -u or set STOREFRONT_API_BASE_URL env var)",
                )?,

            refresh_path: std::env::var("STOREFRONT_REFRESH_PATH")
                .unwrap_or_else(|_| DEFAULT_REFRESH_PATH.to_string()),

            sign_in_path: std::env::var("STOREFRONT_SIGN_IN_PATH")
                .unwrap_or_else(|_| DEFAULT_SIGN_IN_PATH.to_string()),

            credentials_db: args
                .db_file
                .map(|s| expand_tilde(&s))
                .unwrap_or_else(default_credentials_db),

            http_max_connections: env_parse("HTTP_MAX_CONNECTIONS", 20),
            http_connect_timeout: env_parse("HTTP_CONNECT_TIMEOUT", 30),
            http_request_timeout: args.http_timeout,

            refresh_timeout: env_parse("TOKEN_REFRESH_TIMEOUT", DEFAULT_REFRESH_TIMEOUT_SECS),
            max_pending_waiters: env_parse("MAX_PENDING_WAITERS", DEFAULT_MAX_PENDING_WAITERS),

            log_level: args.log_level,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            anyhow::bail!(
                "STOREFRONT_API_BASE_URL must be an http(s) URL: {}",
                self.base_url
            );
        }

        if self.max_pending_waiters == 0 {
            anyhow::bail!("MAX_PENDING_WAITERS must be at least 1");
        }

        if self.refresh_timeout == 0 {
            anyhow::bail!("TOKEN_REFRESH_TIMEOUT must be at least 1 second");
        }

        Ok(())
    }

    /// Settings for the authenticated client
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            base_url: self.base_url.clone(),
            refresh_path: self.refresh_path.clone(),
            sign_in_path: self.sign_in_path.clone(),
            refresh_timeout: Duration::from_secs(self.refresh_timeout),
            max_pending_waiters: self.max_pending_waiters,
        }
    }
}

/// Parse an env var, falling back to `default` when unset or malformed
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// `~/.storefront/credentials.sqlite3`
fn default_credentials_db() -> PathBuf {
    expand_tilde("~/.storefront/credentials.sqlite3")
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
