use serde::{Deserialize, Serialize};

/// Full issue details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
  pub id: String,
  pub key: String,
  pub project_key: String,
  pub summary: String,
  pub description: Option<String>,
  pub status: String,
  pub issue_type: String,
  pub priority: Option<String>,
  pub assignee: Option<String>,
  pub reporter: Option<String>,
  pub labels: Vec<String>,
  pub created: String,
  pub updated: String,
  /// Browser link, e.g. https://acme.atlassian.net/browse/PROJ-123
  pub url: Option<String>,
}

/// Project summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
  pub id: String,
  pub key: String,
  pub name: String,
  pub description: Option<String>,
  pub lead: Option<String>,
}

/// One page of a JQL search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
  pub issues: Vec<Issue>,
  pub total: u64,
  pub max_results: u64,
  pub start_at: u64,
}

/// Paging for JQL searches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
  pub max_results: u32,
  pub start_at: u32,
}

impl SearchOptions {
  pub fn new(max_results: u32, start_at: u32) -> Self {
    Self {
      max_results,
      start_at,
    }
  }

  pub fn max_results(max_results: u32) -> Self {
    Self::new(max_results, 0)
  }
}

impl Default for SearchOptions {
  fn default() -> Self {
    Self::new(50, 0)
  }
}
