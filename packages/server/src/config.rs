use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::kernel::DEFAULT_HASH_COST;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub database_max_connections: u32,
    /// bcrypt cost (log2 rounds), from CREDENTIAL_HASH_ROUNDS
    pub credential_hash_cost: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            credential_hash_cost: match env::var("CREDENTIAL_HASH_ROUNDS") {
                Ok(value) => value
                    .parse()
                    .context("CREDENTIAL_HASH_ROUNDS must be a valid number")?,
                Err(_) => DEFAULT_HASH_COST,
            },
        })
    }
}
