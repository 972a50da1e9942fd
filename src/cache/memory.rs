//! In-process fast cache implementations.

use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::traits::FastCache;

const DEFAULT_MAX_ENTRIES: usize = 10_000;

struct Entry {
  value: Vec<u8>,
  expires_at: Instant,
}

/// TTL map held in process memory.
///
/// Used when no Redis URL is configured, and in tests. Expiry is measured
/// with `tokio::time::Instant`, so paused test clocks drive it.
pub struct MemoryCache {
  entries: Mutex<HashMap<String, Entry>>,
  max_entries: usize,
}

impl MemoryCache {
  pub fn new() -> Self {
    Self::with_capacity(DEFAULT_MAX_ENTRIES)
  }

  /// Cap the number of live entries. When full, the entry closest to
  /// expiry is evicted to make room.
  pub fn with_capacity(max_entries: usize) -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      max_entries: max_entries.max(1),
    }
  }

  pub fn len(&self) -> usize {
    self
      .entries
      .lock()
      .map(|entries| {
        let now = Instant::now();
        entries.values().filter(|e| e.expires_at > now).count()
      })
      .unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for MemoryCache {
  fn default() -> Self {
    Self::new()
  }
}

impl FastCache for MemoryCache {
  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let now = Instant::now();
    match entries.get(key) {
      Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
      Some(_) => {
        entries.remove(key);
        Ok(None)
      }
      None => Ok(None),
    }
  }

  async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let now = Instant::now();
    entries.retain(|_, e| e.expires_at > now);

    if entries.len() >= self.max_entries && !entries.contains_key(key) {
      if let Some(victim) = entries
        .iter()
        .min_by_key(|(_, e)| e.expires_at)
        .map(|(k, _)| k.clone())
      {
        entries.remove(&victim);
      }
    }

    entries.insert(
      key.to_string(),
      Entry {
        value,
        expires_at: now + ttl,
      },
    );
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<()> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries.remove(key);
    Ok(())
  }
}

/// Fast cache that doesn't cache anything.
/// Every read misses and every write is discarded.
pub struct NoopCache;

impl FastCache for NoopCache {
  async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
    Ok(None)
  }

  async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<()> {
    Ok(())
  }

  async fn delete(&self, _key: &str) -> Result<()> {
    Ok(())
  }
}
