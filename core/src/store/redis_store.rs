//! Redis-backed proposal store.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;

use super::{ProposalStore, decode_record, encode_record};
use crate::config::StoreConfig;
use crate::errors::{Result, WatchError};
use crate::proposal::Proposal;

/// Proposal store on a Redis database.
///
/// The connection is opened on first use and cached. Any command failure
/// drops the cached connection so the next call reconnects, which lets the
/// following cycle recover from a restarted server.
pub struct RedisStore {
    client: redis::Client,
    addr: String,
    conn: Mutex<Option<MultiplexedConnection>>,
}

impl RedisStore {
    /// Build the client. Validates the address but does not connect.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let client = redis::Client::open(config.connection_url()).map_err(|e| {
            WatchError::store_with_source(format!("invalid store address {}", config.addr), e)
        })?;
        Ok(Self {
            client,
            addr: config.addr.clone(),
            conn: Mutex::new(None),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let mut cached = self.conn.lock().await;
        if let Some(conn) = cached.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                WatchError::store_with_source(format!("connecting to {} failed", self.addr), e)
            })?;
        tracing::debug!(addr = %self.addr, "Connected to store");
        *cached = Some(conn.clone());
        Ok(conn)
    }

    async fn command_failed(&self, command: &str, key: &str, err: redis::RedisError) -> WatchError {
        self.conn.lock().await.take();
        WatchError::store_with_source(format!("{command} {key} failed"), err)
    }
}

#[async_trait]
impl ProposalStore for RedisStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let result: redis::RedisResult<bool> = conn.exists(key).await;
        match result {
            Ok(found) => Ok(found),
            Err(e) => Err(self.command_failed("EXISTS", key, e).await),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Proposal>> {
        let mut conn = self.connection().await?;
        let result: redis::RedisResult<Option<Vec<u8>>> = conn.get(key).await;
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => return Err(self.command_failed("GET", key, e).await),
        };
        raw.map(|bytes| decode_record(key, &bytes)).transpose()
    }

    async fn put(&self, key: &str, proposal: &Proposal) -> Result<()> {
        let bytes = encode_record(proposal)?;
        let mut conn = self.connection().await?;
        let result: redis::RedisResult<()> = conn.set(key, bytes).await;
        match result {
            Ok(()) => Ok(()),
            Err(e) => Err(self.command_failed("SET", key, e).await),
        }
    }
}
