//! Resilient client for the external score/interest key-value store.
//!
//! Every operation degrades gracefully: an unreachable store, a timed-out
//! call or an undecodable value all surface to callers as "absent" (reads)
//! or "not acknowledged" (writes), never as an error. Scoring falls back to
//! a fresh computation and the request still succeeds.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::Mutex;

use crate::config::Config;

/// Access contract to the external key-value store.
///
/// `cache_get`/`cache_set` move textual floating-point scores; `get` reads
/// raw string payloads (the interest lists). A missing key and an
/// unreachable store are both `None` — callers never need to tell them
/// apart, and must never fail because the store is down.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn cache_get(&self, key: &str) -> Option<f64>;
    /// Returns whether the store acknowledged the write.
    async fn cache_set(&self, key: &str, value: f64, ttl_secs: u64) -> bool;
    async fn get(&self, key: &str) -> Option<String>;
}

/// Connection-retry and timeout knobs for [`RedisStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Bounded number of connect attempts per operation while disconnected.
    pub connect_attempts: u32,
    /// Fixed pause between connect attempts.
    pub retry_backoff: Duration,
    /// Hard timeout on each connect attempt and each get/set call.
    pub op_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            connect_attempts: 3,
            retry_backoff: Duration::from_millis(500),
            op_timeout: Duration::from_secs(2),
        }
    }
}

/// Redis-backed store client with a pooled multiplexed connection.
///
/// Connection lifecycle: Disconnected → (bounded connect retry) → Connected;
/// a transport error on any call drops the pooled connection back to
/// Disconnected, and the next call reconnects. The connection slot is the
/// only shared mutable state; the mutex is held across a retry sequence, but
/// every attempt runs under `op_timeout`, so the wait of other workers is
/// bounded by `connect_attempts * (op_timeout + retry_backoff)`.
pub struct RedisStore {
    client: redis::Client,
    conn: Mutex<Option<MultiplexedConnection>>,
    options: StoreOptions,
}

impl RedisStore {
    pub fn new(url: &str, options: StoreOptions) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| anyhow::anyhow!("invalid store URL {}: {}", url, e))?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
            options,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(&config.store_url, config.store_options())
    }

    /// Returns the pooled connection, reconnecting with bounded retry if the
    /// client is currently disconnected.
    async fn connection(&self) -> Option<MultiplexedConnection> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Some(conn.clone());
        }

        for attempt in 1..=self.options.connect_attempts {
            match tokio::time::timeout(
                self.options.op_timeout,
                self.client.get_multiplexed_async_connection(),
            )
            .await
            {
                Ok(Ok(conn)) => {
                    tracing::info!("Connected to key-value store");
                    *guard = Some(conn.clone());
                    return Some(conn);
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        "Store connect attempt {}/{} failed: {}",
                        attempt,
                        self.options.connect_attempts,
                        e
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        "Store connect attempt {}/{} timed out",
                        attempt,
                        self.options.connect_attempts
                    );
                }
            }
            if attempt < self.options.connect_attempts {
                tokio::time::sleep(self.options.retry_backoff).await;
            }
        }

        tracing::error!(
            "Key-value store unreachable after {} attempts",
            self.options.connect_attempts
        );
        None
    }

    /// Drops the pooled connection after a transport error; the next call
    /// goes through the reconnect path.
    async fn mark_disconnected(&self) {
        *self.conn.lock().await = None;
    }

    async fn raw_get(&self, key: &str) -> Option<String> {
        let mut conn = self.connection().await?;
        match tokio::time::timeout(self.options.op_timeout, conn.get::<_, Option<String>>(key))
            .await
        {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::warn!("Store GET {} failed: {}", key, e);
                self.mark_disconnected().await;
                None
            }
            Err(_) => {
                tracing::warn!("Store GET {} timed out", key);
                self.mark_disconnected().await;
                None
            }
        }
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn cache_get(&self, key: &str) -> Option<f64> {
        let raw = self.raw_get(key).await?;
        match raw.parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Store value under {} is not a float: {:?}", key, raw);
                None
            }
        }
    }

    async fn cache_set(&self, key: &str, value: f64, ttl_secs: u64) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        match tokio::time::timeout(
            self.options.op_timeout,
            conn.set_ex::<_, _, ()>(key, value.to_string(), ttl_secs),
        )
        .await
        {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!("Store SET {} failed: {}", key, e);
                self.mark_disconnected().await;
                false
            }
            Err(_) => {
                tracing::warn!("Store SET {} timed out", key);
                self.mark_disconnected().await;
                false
            }
        }
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.raw_get(key).await
    }
}

/// In-memory store for tests and local development.
///
/// Behaves like an always-reachable store that never expires entries; the
/// TTL argument is accepted and ignored.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: std::sync::Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw value, e.g. an interests list under an `i:` key.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data
            .lock()
            .expect("memory store lock")
            .insert(key.into(), value.into());
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn cache_get(&self, key: &str) -> Option<f64> {
        self.get(key).await?.parse().ok()
    }

    async fn cache_set(&self, key: &str, value: f64, _ttl_secs: u64) -> bool {
        self.insert(key, value.to_string());
        true
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.data.lock().expect("memory store lock").get(key).cloned()
    }
}
