//! Two-tier caching for upstream reads.
//!
//! - A fast cache (Redis or in-process) holds JSON snapshots under flat,
//!   prefixed keys with a TTL per entity kind
//! - A durable SQLite cache mirrors issues and pull requests as last-known
//!   snapshots
//! - The cache layer applies cache-aside reads over the fast cache, with an
//!   opt-in durable fallback when the upstream fails

mod durable;
mod keys;
mod layer;
mod memory;
mod redis_store;
mod traits;

pub use durable::{DurableCache, DurableRow};
pub use keys::{CacheKey, EntityKind};
pub use layer::CacheLayer;
pub use memory::{MemoryCache, NoopCache};
pub use redis_store::RedisCache;
pub use traits::{CacheResult, CacheSource, Cacheable, FastCache};
