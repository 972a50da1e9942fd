//! Caching implementations for Jira types.

use crate::cache::Cacheable;

use super::types::{Issue, SearchResult};

impl Cacheable for Issue {
  fn entity_type() -> &'static str {
    "issue"
  }
}

impl Cacheable for SearchResult {
  fn entity_type() -> &'static str {
    "search_result"
  }
}
