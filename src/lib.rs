//! Cached read path over Jira and Bitbucket for chat-ops bridges.
//!
//! Every facade operation answers with a [`Response`]: either `data` or a
//! human-readable `error`. Reads go through a fast TTL cache first and are
//! mirrored to a durable SQLite cache where a local copy is useful.

pub mod bitbucket;
pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod jira;
pub mod logging;
pub mod response;

pub use bridge::{Bridge, FastCacheBackend};
pub use config::Config;
pub use error::{ClientError, ClientResult};
pub use response::{ConnectionInfo, Response};
