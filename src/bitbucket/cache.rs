//! Caching implementations for Bitbucket types.

use crate::cache::Cacheable;

use super::types::{Branch, PullRequest};

impl Cacheable for PullRequest {
  fn entity_type() -> &'static str {
    "pull_request"
  }
}

impl Cacheable for Branch {
  fn entity_type() -> &'static str {
    "branch"
  }
}
