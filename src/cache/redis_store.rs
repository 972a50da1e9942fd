//! Redis-backed fast cache.

use color_eyre::{eyre::eyre, Result};
use redis::AsyncCommands;
use std::time::Duration;
use tokio::time::timeout;

use super::traits::FastCache;

const DEFAULT_OP_TIMEOUT: Duration = Duration::from_millis(500);

/// Fast cache stored in Redis with `SET key value EX ttl`.
///
/// Connections come from the driver's multiplexed connection; this type keeps
/// no pool of its own.
#[derive(Clone)]
pub struct RedisCache {
  client: redis::Client,
  op_timeout: Duration,
}

impl RedisCache {
  /// Open a client for `url`. No connection is made until first use.
  pub fn new(url: &str) -> Result<Self> {
    let client =
      redis::Client::open(url).map_err(|e| eyre!("Invalid Redis URL {}: {}", url, e))?;
    Ok(Self {
      client,
      op_timeout: DEFAULT_OP_TIMEOUT,
    })
  }

  /// Bound every Redis round trip by `op_timeout`.
  pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
    self.op_timeout = op_timeout;
    self
  }

  async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
    timeout(
      self.op_timeout,
      self.client.get_multiplexed_async_connection(),
    )
    .await
    .map_err(|_| eyre!("Redis connect timed out"))?
    .map_err(|e| eyre!("Redis connect failed: {}", e))
  }
}

impl FastCache for RedisCache {
  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    let mut conn = self.connection().await?;
    timeout(self.op_timeout, conn.get::<_, Option<Vec<u8>>>(key))
      .await
      .map_err(|_| eyre!("Redis GET timed out"))?
      .map_err(|e| eyre!("Redis GET {} failed: {}", key, e))
  }

  async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
    let mut conn = self.connection().await?;
    // EX 0 is rejected by Redis
    let seconds = ttl.as_secs().max(1);
    timeout(self.op_timeout, conn.set_ex::<_, _, ()>(key, value, seconds))
      .await
      .map_err(|_| eyre!("Redis SET timed out"))?
      .map_err(|e| eyre!("Redis SET {} failed: {}", key, e))
  }

  async fn delete(&self, key: &str) -> Result<()> {
    let mut conn = self.connection().await?;
    timeout(self.op_timeout, conn.del::<_, ()>(key))
      .await
      .map_err(|_| eyre!("Redis DEL timed out"))?
      .map_err(|e| eyre!("Redis DEL {} failed: {}", key, e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rejects_malformed_url() {
    assert!(RedisCache::new("not a url").is_err());
  }

  #[tokio::test]
  async fn test_unreachable_server_reports_error() {
    // Port 1 is never a Redis server; the call must fail, not hang.
    let cache = RedisCache::new("redis://127.0.0.1:1/")
      .unwrap()
      .with_op_timeout(Duration::from_millis(200));
    assert!(cache.get("jira:issue:A-1").await.is_err());
  }
}
