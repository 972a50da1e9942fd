//! Construction of every long-lived handle from a [`Config`].
//!
//! One client and one cache handle per upstream per process, built once at
//! startup and shared by reference.

use color_eyre::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::bitbucket::{BitbucketClient, BitbucketService};
use crate::cache::{CacheLayer, DurableCache, FastCache, MemoryCache, RedisCache};
use crate::config::Config;
use crate::jira::{JiraClient, JiraService};

/// Fast cache chosen at startup: Redis when a URL is configured,
/// otherwise an in-process map.
pub enum FastCacheBackend {
  Redis(RedisCache),
  Memory(MemoryCache),
}

impl FastCacheBackend {
  pub fn from_config(config: &Config) -> Self {
    let Some(url) = config.cache.redis_url.as_deref() else {
      tracing::info!("no Redis URL configured, using in-process fast cache");
      return FastCacheBackend::Memory(MemoryCache::new());
    };

    match RedisCache::new(url) {
      Ok(redis) => FastCacheBackend::Redis(redis),
      Err(e) => {
        tracing::warn!(error = %e, "Redis unavailable, using in-process fast cache");
        FastCacheBackend::Memory(MemoryCache::new())
      }
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      FastCacheBackend::Redis(_) => "redis",
      FastCacheBackend::Memory(_) => "memory",
    }
  }
}

impl FastCache for FastCacheBackend {
  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    match self {
      FastCacheBackend::Redis(c) => c.get(key).await,
      FastCacheBackend::Memory(c) => c.get(key).await,
    }
  }

  async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
    match self {
      FastCacheBackend::Redis(c) => c.set(key, value, ttl).await,
      FastCacheBackend::Memory(c) => c.set(key, value, ttl).await,
    }
  }

  async fn delete(&self, key: &str) -> Result<()> {
    match self {
      FastCacheBackend::Redis(c) => c.delete(key).await,
      FastCacheBackend::Memory(c) => c.delete(key).await,
    }
  }
}

pub type Jira = JiraService<JiraClient, FastCacheBackend>;
pub type Bitbucket = BitbucketService<BitbucketClient, FastCacheBackend>;

/// Both facades wired to shared caches.
pub struct Bridge {
  pub jira: Jira,
  pub bitbucket: Bitbucket,
  durable: Option<Arc<DurableCache>>,
}

impl Bridge {
  /// Build everything. Never fails: missing credentials disable a client,
  /// an unusable durable cache is skipped and a bad Redis URL falls back to
  /// the in-process cache.
  pub fn from_config(config: &Config) -> Self {
    let fast = Arc::new(FastCacheBackend::from_config(config));
    let stale_max = config.fallback_stale_max();
    let layer = CacheLayer::new(fast).with_durable_fallback(stale_max);

    let durable = match DurableCache::open(config.cache.db_path.as_deref()) {
      Ok(durable) => Some(Arc::new(durable)),
      Err(e) => {
        tracing::warn!(error = %e, "durable cache unavailable, continuing without it");
        None
      }
    };

    let timeout = config.http_timeout();

    let jira = JiraService::new(
      Arc::new(JiraClient::new(&config.jira, timeout)),
      layer.clone(),
    )
    .with_durable(durable.clone())
    .with_project_key(config.jira.project_key.clone())
    .with_email(config.jira.email.clone());

    let bitbucket = BitbucketService::new(
      Arc::new(BitbucketClient::new(&config.bitbucket, timeout)),
      layer.clone(),
    )
    .with_durable(durable.clone())
    .with_default_repo(config.bitbucket.default_repo.clone());

    tracing::info!(
      fast_cache = layer.fast_cache().name(),
      durable_cache = durable.is_some(),
      dc_fallback = stale_max.is_some(),
      "bridge ready"
    );

    Self {
      jira,
      bitbucket,
      durable,
    }
  }

  pub fn durable_cache(&self) -> Option<&Arc<DurableCache>> {
    self.durable.as_ref()
  }
}
