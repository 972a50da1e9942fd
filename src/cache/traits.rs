//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;

/// Trait for entities that can be held in the caches.
///
/// Values travel through the fast cache as JSON bytes, so every cacheable
/// type must round-trip through serde.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Entity type name for logs and storage organization (e.g., "issue", "pull_request")
  fn entity_type() -> &'static str;
}

impl<T: Cacheable> Cacheable for Vec<T> {
  fn entity_type() -> &'static str {
    T::entity_type()
  }
}

/// Ephemeral key/value store with per-key TTL.
///
/// The key namespace is flat; see [`super::CacheKey`] for the prefix
/// discipline. Implementations report their own failures; callers decide
/// whether to absorb them.
pub trait FastCache: Send + Sync + 'static {
  /// Fetch the bytes stored under `key`, or `None` when absent or expired.
  fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

  /// Store `value` under `key` for `ttl`, replacing any previous value.
  fn set(&self, key: &str, value: Vec<u8>, ttl: Duration)
    -> impl Future<Output = Result<()>> + Send;

  /// Remove `key`. Removing an absent key is not an error.
  fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the durable row was written (fallback reads only)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Fresh data from the upstream.
  pub fn from_remote(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Remote,
      cached_at: None,
    }
  }

  /// Data served from the fast cache within its TTL.
  pub fn from_fast_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::FastCache,
      cached_at: None,
    }
  }

  /// Last-known snapshot served because the upstream failed.
  pub fn fallback(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::DurableFallback,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  Remote,
  FastCache,
  /// Upstream failed; served from the durable cache within `staleMax`
  DurableFallback,
}
