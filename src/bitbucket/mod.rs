pub mod api_types;
pub mod cache;
pub mod client;
pub mod normalize;
pub mod service;
pub mod types;

pub use client::{BitbucketClient, CodeHost};
pub use service::BitbucketService;
pub use types::{Branch, Commit, CreatePullRequest, PrState, PullRequest, Repository};
