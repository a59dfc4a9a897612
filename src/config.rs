use std::time::Duration;

use serde::Deserialize;

use crate::store::StoreOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub store_url: String,
    pub store_connect_attempts: u32,
    pub store_retry_backoff_ms: u64,
    pub store_op_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            store_url: std::env::var("STORE_URL")
                .or_else(|_| std::env::var("REDIS_URL"))
                .unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string())
                .trim()
                .to_string(),
            store_connect_attempts: parse_env("STORE_CONNECT_ATTEMPTS", 3)?,
            store_retry_backoff_ms: parse_env("STORE_RETRY_BACKOFF_MS", 500)?,
            store_op_timeout_ms: parse_env("STORE_OP_TIMEOUT_MS", 2000)?,
        };

        if !config.store_url.starts_with("redis://") && !config.store_url.starts_with("rediss://") {
            anyhow::bail!("STORE_URL must start with redis:// or rediss://");
        }
        if config.store_connect_attempts == 0 {
            anyhow::bail!("STORE_CONNECT_ATTEMPTS must be at least 1");
        }

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Store URL: {}", config.store_url);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Retry/timeout knobs for the store client.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            connect_attempts: self.store_connect_attempts,
            retry_backoff: Duration::from_millis(self.store_retry_backoff_ms),
            op_timeout: Duration::from_millis(self.store_op_timeout_ms),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", name)),
        Err(_) => Ok(default),
    }
}
