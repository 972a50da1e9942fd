//! Serde-deserializable types matching Bitbucket Cloud 2.0 responses.
//!
//! Nested objects are optional throughout; Bitbucket omits them for deleted
//! users, detached branches and the like.

use serde::{Deserialize, Serialize};

/// Every list endpoint wraps its items in a page
#[derive(Debug, Deserialize)]
pub struct ApiPage<T> {
  #[serde(default = "Vec::new")]
  pub values: Vec<T>,
  pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiAccount {
  pub display_name: Option<String>,
  pub nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiBranchRef {
  pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiEndpoint {
  pub branch: Option<ApiBranchRef>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPullRequest {
  pub id: u64,
  #[serde(default)]
  pub title: String,
  pub description: Option<String>,
  pub state: Option<String>,
  pub author: Option<ApiAccount>,
  pub source: Option<ApiEndpoint>,
  pub destination: Option<ApiEndpoint>,
  #[serde(default)]
  pub created_on: String,
  #[serde(default)]
  pub updated_on: String,
  pub comment_count: Option<u32>,
  #[serde(default)]
  pub reviewers: Vec<ApiAccount>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCommitRef {
  pub hash: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiBranch {
  pub name: String,
  pub target: Option<ApiCommitRef>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCommitAuthor {
  /// Raw "Name <email>" string from the commit
  pub raw: Option<String>,
  pub user: Option<ApiAccount>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCommit {
  pub hash: String,
  #[serde(default)]
  pub message: String,
  pub author: Option<ApiCommitAuthor>,
  #[serde(default)]
  pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiRepository {
  #[serde(default)]
  pub slug: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub full_name: String,
  pub description: Option<String>,
  #[serde(default)]
  pub is_private: bool,
  pub mainbranch: Option<ApiBranchRef>,
  pub language: Option<String>,
  #[serde(default)]
  pub updated_on: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiWorkspace {
  pub slug: Option<String>,
  pub name: Option<String>,
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiBranchName<'a> {
  pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ApiEndpointRequest<'a> {
  pub branch: ApiBranchName<'a>,
}

#[derive(Debug, Serialize)]
pub struct ApiCreatePullRequest<'a> {
  pub title: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<&'a str>,
  pub source: ApiEndpointRequest<'a>,
  pub destination: ApiEndpointRequest<'a>,
  pub close_source_branch: bool,
}
