//! Cache layer that orchestrates caching logic with network fetching.

use chrono::Utc;
use color_eyre::Result;
use std::future::Future;
use std::sync::Arc;

use super::durable::DurableRow;
use super::keys::CacheKey;
use super::traits::{CacheResult, Cacheable, FastCache};
use crate::error::ClientResult;

/// Cache-aside reads over a fast cache.
///
/// Cache failures never reach the caller: reads that fail count as misses
/// and writes that fail are logged and dropped. Concurrent misses on the same
/// key each call the upstream; the later write simply replaces the earlier.
pub struct CacheLayer<F: FastCache> {
  fast: Arc<F>,
  /// When set, serve a durable row this fresh if the upstream fails
  fallback_stale_max: Option<chrono::Duration>,
}

impl<F: FastCache> CacheLayer<F> {
  pub fn new(fast: Arc<F>) -> Self {
    Self {
      fast,
      fallback_stale_max: None,
    }
  }

  /// Enable the durable-cache fallback for upstream failures.
  pub fn with_durable_fallback(mut self, stale_max: Option<chrono::Duration>) -> Self {
    self.fallback_stale_max = stale_max;
    self
  }

  pub fn fast_cache(&self) -> &Arc<F> {
    &self.fast
  }

  /// Read and decode `key`. Any failure is logged and reported as a miss.
  pub async fn read<T: Cacheable>(&self, key: &CacheKey) -> Option<T> {
    let bytes = match self.fast.get(&key.as_key()).await {
      Ok(Some(bytes)) => bytes,
      Ok(None) => {
        tracing::debug!(key = %key, entity = T::entity_type(), "cache miss");
        return None;
      }
      Err(e) => {
        tracing::warn!(error = %e, key = %key, "cache read failed");
        return None;
      }
    };

    match serde_json::from_slice(&bytes) {
      Ok(value) => {
        tracing::debug!(key = %key, entity = T::entity_type(), "cache hit");
        Some(value)
      }
      Err(e) => {
        tracing::warn!(error = %e, key = %key, "cached value could not be decoded");
        None
      }
    }
  }

  /// Encode and store `value` with the key's TTL. Failures are logged only.
  pub async fn write<T: Cacheable>(&self, key: &CacheKey, value: &T) {
    let bytes = match serde_json::to_vec(value) {
      Ok(bytes) => bytes,
      Err(e) => {
        tracing::warn!(error = %e, key = %key, "cache value could not be encoded");
        return;
      }
    };

    if let Err(e) = self.fast.set(&key.as_key(), bytes, key.ttl()).await {
      tracing::warn!(error = %e, key = %key, "cache write failed");
    }
  }

  /// Drop `key` so the next read goes upstream. Failures are logged only.
  pub async fn invalidate(&self, key: &CacheKey) {
    if let Err(e) = self.fast.delete(&key.as_key()).await {
      tracing::warn!(error = %e, key = %key, "cache invalidate failed");
    }
  }

  /// Fetch a single entity with cache-aside.
  ///
  /// 1. Check the fast cache - if present, return it
  /// 2. Otherwise fetch from the upstream and write the result back
  /// 3. Upstream failures propagate
  pub async fn fetch_one<T, Fut, Fetch>(
    &self,
    key: &CacheKey,
    fetcher: Fetch,
  ) -> ClientResult<CacheResult<T>>
  where
    T: Cacheable,
    Fetch: FnOnce() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
  {
    self.fetch_one_or_durable(key, fetcher, || Ok(None)).await
  }

  /// Like [`Self::fetch_one`], but when the durable fallback is enabled and
  /// the upstream fails, a durable row no older than the configured
  /// `stale_max` is served instead of the error.
  pub async fn fetch_one_or_durable<T, Fut, Fetch, Durable>(
    &self,
    key: &CacheKey,
    fetcher: Fetch,
    durable: Durable,
  ) -> ClientResult<CacheResult<T>>
  where
    T: Cacheable,
    Fetch: FnOnce() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
    Durable: FnOnce() -> Result<Option<DurableRow<T>>>,
  {
    if let Some(cached) = self.read::<T>(key).await {
      return Ok(CacheResult::from_fast_cache(cached));
    }

    match fetcher().await {
      Ok(data) => {
        self.write(key, &data).await;
        Ok(CacheResult::from_remote(data))
      }
      Err(err) => {
        let Some(stale_max) = self.fallback_stale_max else {
          return Err(err);
        };
        if err.is_not_configured() {
          return Err(err);
        }

        match durable() {
          Ok(Some(row)) if row.is_within(stale_max, Utc::now()) => {
            tracing::warn!(
              error = %err,
              key = %key,
              last_updated = %row.last_updated,
              "upstream failed, serving durable snapshot"
            );
            Ok(CacheResult::fallback(row.entity, row.last_updated))
          }
          Ok(_) => Err(err),
          Err(e) => {
            tracing::warn!(error = %e, key = %key, "durable fallback read failed");
            Err(err)
          }
        }
      }
    }
  }
}

impl<F: FastCache> Clone for CacheLayer<F> {
  fn clone(&self) -> Self {
    Self {
      fast: Arc::clone(&self.fast),
      fallback_stale_max: self.fallback_stale_max,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryCache;
  use crate::error::ClientError;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration;

  #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
  struct Widget {
    name: String,
  }

  impl Cacheable for Widget {
    fn entity_type() -> &'static str {
      "widget"
    }
  }

  /// Fast cache whose every operation fails.
  struct BrokenCache;

  impl FastCache for BrokenCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
      Err(color_eyre::eyre::eyre!("connection refused"))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<()> {
      Err(color_eyre::eyre::eyre!("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<()> {
      Err(color_eyre::eyre::eyre!("connection refused"))
    }
  }

  fn widget(name: &str) -> Widget {
    Widget {
      name: name.to_string(),
    }
  }

  #[tokio::test]
  async fn test_miss_then_hit() {
    let layer = CacheLayer::new(Arc::new(MemoryCache::new()));
    let calls = AtomicU32::new(0);
    let key = CacheKey::issue("W-1");

    for _ in 0..2 {
      let result = layer
        .fetch_one(&key, || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(widget("gear"))
        })
        .await
        .unwrap();
      assert_eq!(result.data, widget("gear"));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_broken_cache_falls_through_to_remote() {
    let layer = CacheLayer::new(Arc::new(BrokenCache));
    let result = layer
      .fetch_one(&CacheKey::issue("W-1"), || async { Ok(widget("gear")) })
      .await
      .unwrap();

    assert_eq!(result.source, crate::cache::CacheSource::Remote);
    layer.invalidate(&CacheKey::issue("W-1")).await;
  }

  #[tokio::test]
  async fn test_undecodable_entry_is_a_miss() {
    let fast = Arc::new(MemoryCache::new());
    fast
      .set("jira:issue:W-1", b"not json".to_vec(), Duration::from_secs(60))
      .await
      .unwrap();
    let layer = CacheLayer::new(fast);

    assert!(layer.read::<Widget>(&CacheKey::issue("W-1")).await.is_none());
  }

  #[tokio::test]
  async fn test_upstream_error_propagates_without_fallback() {
    let layer = CacheLayer::new(Arc::new(MemoryCache::new()));
    let result = layer
      .fetch_one_or_durable(
        &CacheKey::issue("W-1"),
        || async {
          Err::<Widget, _>(ClientError::Http {
            status: 503,
            message: "Service Unavailable".to_string(),
          })
        },
        || {
          Ok(Some(DurableRow {
            entity: widget("old"),
            last_updated: Utc::now(),
          }))
        },
      )
      .await;

    assert_eq!(result.unwrap_err().to_string(), "Service Unavailable");
  }

  #[tokio::test]
  async fn test_fallback_serves_fresh_enough_row() {
    let layer = CacheLayer::new(Arc::new(MemoryCache::new()))
      .with_durable_fallback(Some(chrono::Duration::hours(1)));

    let result = layer
      .fetch_one_or_durable(
        &CacheKey::issue("W-1"),
        || async {
          Err::<Widget, _>(ClientError::Http {
            status: 503,
            message: "Service Unavailable".to_string(),
          })
        },
        || {
          Ok(Some(DurableRow {
            entity: widget("old"),
            last_updated: Utc::now() - chrono::Duration::minutes(5),
          }))
        },
      )
      .await
      .unwrap();

    assert_eq!(result.data, widget("old"));
    assert_eq!(result.source, crate::cache::CacheSource::DurableFallback);
  }

  #[tokio::test]
  async fn test_fallback_rejects_stale_row() {
    let layer = CacheLayer::new(Arc::new(MemoryCache::new()))
      .with_durable_fallback(Some(chrono::Duration::minutes(1)));

    let result = layer
      .fetch_one_or_durable(
        &CacheKey::issue("W-1"),
        || async {
          Err::<Widget, _>(ClientError::Http {
            status: 503,
            message: "Service Unavailable".to_string(),
          })
        },
        || {
          Ok(Some(DurableRow {
            entity: widget("old"),
            last_updated: Utc::now() - chrono::Duration::hours(2),
          }))
        },
      )
      .await;

    assert!(result.is_err());
  }
}
