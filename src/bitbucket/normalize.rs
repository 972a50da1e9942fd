//! Conversions from Bitbucket API payloads to domain types.

use super::api_types::{
  ApiAccount, ApiBranch, ApiBranchName, ApiCommit, ApiCommitAuthor, ApiCreatePullRequest,
  ApiEndpoint, ApiEndpointRequest, ApiPullRequest, ApiRepository, ApiWorkspace,
};
use super::types::{Branch, Commit, CreatePullRequest, PrState, PullRequest, Repository};
use crate::response::ConnectionInfo;

const SHORT_HASH_LEN: usize = 8;

impl ApiPullRequest {
  /// Pull request payloads don't repeat the repository, so the caller
  /// supplies the slug it asked for.
  pub fn normalize(self, repo_slug: &str) -> PullRequest {
    let state = match self.state.as_deref().map(PrState::parse) {
      Some(Some(state)) => state,
      Some(None) => {
        tracing::warn!(state = ?self.state, pr_id = self.id, "unknown pull request state");
        PrState::default()
      }
      None => PrState::default(),
    };

    PullRequest {
      id: self.id,
      repo_slug: repo_slug.to_string(),
      title: self.title,
      description: self.description,
      state,
      author: self.author.and_then(account_name),
      source_branch: branch_name(self.source),
      destination_branch: branch_name(self.destination),
      created_on: self.created_on,
      updated_on: self.updated_on,
      comment_count: self.comment_count,
      reviewers: self.reviewers.into_iter().filter_map(account_name).collect(),
    }
  }
}

impl ApiBranch {
  pub fn normalize(self, default_branch: Option<&str>) -> Branch {
    Branch {
      is_default: default_branch == Some(self.name.as_str()),
      latest_commit: self
        .target
        .and_then(|t| t.hash)
        .map(|hash| short_hash(&hash)),
      name: self.name,
    }
  }
}

impl From<ApiCommit> for Commit {
  fn from(commit: ApiCommit) -> Self {
    Commit {
      hash: short_hash(&commit.hash),
      message: first_line(&commit.message),
      author: commit.author.map(commit_author).unwrap_or_default(),
      date: commit.date,
    }
  }
}

impl From<ApiRepository> for Repository {
  fn from(repo: ApiRepository) -> Self {
    Repository {
      slug: repo.slug,
      name: repo.name,
      full_name: repo.full_name,
      description: repo.description,
      is_private: repo.is_private,
      main_branch: repo.mainbranch.and_then(|b| b.name),
      language: repo.language,
      updated_on: repo.updated_on,
    }
  }
}

impl ApiWorkspace {
  pub fn into_connection_info(self, workspace: &str) -> ConnectionInfo {
    let name = self.name.unwrap_or_else(|| workspace.to_string());
    ConnectionInfo {
      workspace: Some(self.slug.unwrap_or_else(|| workspace.to_string())),
      ..ConnectionInfo::connected(format!("Successfully connected to workspace {}", name))
    }
  }
}

impl CreatePullRequest {
  pub fn to_api(&self) -> ApiCreatePullRequest<'_> {
    ApiCreatePullRequest {
      title: &self.title,
      description: self.description.as_deref(),
      source: ApiEndpointRequest {
        branch: ApiBranchName {
          name: &self.source_branch,
        },
      },
      destination: ApiEndpointRequest {
        branch: ApiBranchName {
          name: &self.destination_branch,
        },
      },
      close_source_branch: self.close_source_branch,
    }
  }
}

/// First `SHORT_HASH_LEN` characters of a commit hash.
pub fn short_hash(hash: &str) -> String {
  hash.chars().take(SHORT_HASH_LEN).collect()
}

/// Text up to the first line break.
pub fn first_line(message: &str) -> String {
  message.lines().next().unwrap_or_default().trim_end().to_string()
}

fn account_name(account: ApiAccount) -> Option<String> {
  account.display_name.or(account.nickname)
}

fn branch_name(endpoint: Option<ApiEndpoint>) -> String {
  endpoint
    .and_then(|e| e.branch)
    .and_then(|b| b.name)
    .unwrap_or_default()
}

/// Linked account name, else the name part of the raw `Name <email>`.
fn commit_author(author: ApiCommitAuthor) -> String {
  if let Some(name) = author.user.and_then(account_name) {
    return name;
  }
  let raw = author.raw.unwrap_or_default();
  match raw.split_once('<') {
    Some((name, _)) if !name.trim().is_empty() => name.trim().to_string(),
    _ => raw.trim().to_string(),
  }
}
