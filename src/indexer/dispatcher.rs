//! Index channel dispatchers.
//!
//! The trait is the seam between score persistence and the search-indexing
//! transport; the redis implementation publishes JSON events over a bb8
//! connection pool.

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};

use crate::config::IndexConfig;
use crate::error::{AppError, AppResult};
use crate::indexer::event::IndexEvent;

type RedisPool = Pool<Client>;

/// Sends one index-update event to the search-indexing service.
///
/// Implementations must treat delivery as best-effort: errors are reported
/// so the caller can count them, never so it can fail a run.
#[async_trait]
pub trait IndexDispatcher: Send + Sync {
    async fn dispatch(&self, event: &IndexEvent) -> AppResult<()>;

    /// Dispatcher name for logging
    fn name(&self) -> &'static str;
}

/// Publishes index events to `{prefix}:{destination}` redis channels.
pub struct RedisIndexDispatcher {
    pool: RedisPool,
    channel_prefix: String,
}

impl RedisIndexDispatcher {
    pub async fn connect(config: &IndexConfig) -> AppResult<Self> {
        let client = Client::open(config.redis_url.as_str())
            .map_err(|e| AppError::dispatch("index channel", e))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(std::time::Duration::from_secs(config.connection_timeout))
            .build(client)
            .await
            .map_err(|e| AppError::dispatch("index channel", e))?;

        Ok(Self {
            pool,
            channel_prefix: config.channel_prefix.clone(),
        })
    }

    fn channel_for(&self, event: &IndexEvent) -> String {
        format!("{}:{}", self.channel_prefix, event.destination.as_str())
    }

    async fn get_conn(&self) -> AppResult<PooledConnection<'_, Client>> {
        self.pool
            .get()
            .await
            .map_err(|e| AppError::dispatch("index channel", anyhow::anyhow!(e.to_string())))
    }
}

#[async_trait]
impl IndexDispatcher for RedisIndexDispatcher {
    async fn dispatch(&self, event: &IndexEvent) -> AppResult<()> {
        let channel = self.channel_for(event);
        let payload = serde_json::to_string(event)
            .map_err(|e| AppError::dispatch(channel.clone(), e))?;

        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref
            .publish::<_, _, ()>(&channel, payload)
            .await
            .map_err(|e| AppError::dispatch(channel, e))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
