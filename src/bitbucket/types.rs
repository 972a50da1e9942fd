use serde::{Deserialize, Serialize};

/// Pull request lifecycle state as Bitbucket names it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrState {
  #[default]
  Open,
  Merged,
  Declined,
  Superseded,
}

impl PrState {
  pub fn as_str(self) -> &'static str {
    match self {
      PrState::Open => "OPEN",
      PrState::Merged => "MERGED",
      PrState::Declined => "DECLINED",
      PrState::Superseded => "SUPERSEDED",
    }
  }

  /// Parse a state name, ignoring case.
  pub fn parse(s: &str) -> Option<Self> {
    match s.to_ascii_uppercase().as_str() {
      "OPEN" => Some(PrState::Open),
      "MERGED" => Some(PrState::Merged),
      "DECLINED" => Some(PrState::Declined),
      "SUPERSEDED" => Some(PrState::Superseded),
      _ => None,
    }
  }
}

impl std::fmt::Display for PrState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
  pub id: u64,
  pub repo_slug: String,
  pub title: String,
  pub description: Option<String>,
  pub state: PrState,
  pub author: Option<String>,
  pub source_branch: String,
  pub destination_branch: String,
  pub created_on: String,
  pub updated_on: String,
  pub comment_count: Option<u32>,
  pub reviewers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
  pub name: String,
  pub is_default: bool,
  /// Short hash of the branch head
  pub latest_commit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
  /// First 8 characters of the full hash
  pub hash: String,
  /// First line of the commit message
  pub message: String,
  pub author: String,
  pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
  pub slug: String,
  pub name: String,
  pub full_name: String,
  pub description: Option<String>,
  pub is_private: bool,
  pub main_branch: Option<String>,
  pub language: Option<String>,
  pub updated_on: String,
}

/// Payload for opening a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePullRequest {
  pub repo_slug: String,
  pub title: String,
  pub description: Option<String>,
  pub source_branch: String,
  pub destination_branch: String,
  #[serde(default)]
  pub close_source_branch: bool,
}
