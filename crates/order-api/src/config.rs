//! Configuration management for the Order API
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

use crate::auth::SeedCredential;

/// Development signing key, used only when `JWT_SECRET` is unset
const DEV_SIGNING_KEY: &str = "your_secret_key";

/// Which backing store to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    /// In-process store, contents are lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("Unknown STORE_BACKEND: {}", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// Redis connection URL
    pub redis_url: String,

    pub store_backend: StoreBackend,

    /// HMAC key for access tokens
    pub jwt_secret: String,

    /// Bootstrap admin account
    pub seed: SeedCredential,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET is not set, using the development signing key");
            DEV_SIGNING_KEY.to_string()
        });

        let defaults = SeedCredential::default();

        let config = Config {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid API_PORT")?,

            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),

            store_backend: env::var("STORE_BACKEND")
                .unwrap_or_else(|_| "redis".to_string())
                .parse()?,

            jwt_secret,

            seed: SeedCredential {
                username: env::var("SEED_USERNAME").unwrap_or(defaults.username),
                password: env::var("SEED_PASSWORD").unwrap_or(defaults.password),
            },
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be greater than 0");
        }

        if self.jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        if self.seed.username.is_empty() || self.seed.password.is_empty() {
            anyhow::bail!("SEED_USERNAME and SEED_PASSWORD must not be empty");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}
