//! Fast-cache key namespace and TTL policy.

use std::time::Duration;
use url::form_urlencoded;

/// Key prefix for Jira entries.
pub const JIRA_PREFIX: &str = "jira";

/// Key prefix for Bitbucket entries.
pub const BITBUCKET_PREFIX: &str = "bb";

/// Kinds of entity the bridge knows a freshness window for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
  Issue,
  ActiveSprint,
  UserIssues,
  PullRequest,
  Branches,
  // Reserved: these have a window in the policy table, but no read caches
  // them and no `CacheKey` maps to them.
  Project,
  Commits,
  Repositories,
}

impl EntityKind {
  /// Fast-cache TTL for this kind.
  pub fn ttl(self) -> Duration {
    let secs = match self {
      Self::Issue => 300,
      Self::ActiveSprint => 600,
      Self::UserIssues => 120,
      Self::Project => 3600,
      Self::PullRequest => 180,
      Self::Branches => 900,
      Self::Commits => 300,
      Self::Repositories => 600,
    };
    Duration::from_secs(secs)
  }
}

/// Keys for every entry the facades place in the fast cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheKey {
  /// A single issue by key
  Issue { issue_key: String },
  /// Open-sprint search for a project
  ActiveSprint { project_key: String },
  /// Open issues assigned to an email
  UserIssues { email: String },
  /// A single pull request
  PullRequest { repo_slug: String, pr_id: u64 },
  /// Every branch of a repository
  Branches { repo_slug: String },
}

impl CacheKey {
  pub fn issue(issue_key: &str) -> Self {
    Self::Issue {
      issue_key: issue_key.to_string(),
    }
  }

  pub fn active_sprint(project_key: &str) -> Self {
    Self::ActiveSprint {
      project_key: project_key.to_string(),
    }
  }

  pub fn user_issues(email: &str) -> Self {
    Self::UserIssues {
      email: email.to_string(),
    }
  }

  pub fn pull_request(repo_slug: &str, pr_id: u64) -> Self {
    Self::PullRequest {
      repo_slug: repo_slug.to_string(),
      pr_id,
    }
  }

  pub fn branches(repo_slug: &str) -> Self {
    Self::Branches {
      repo_slug: repo_slug.to_string(),
    }
  }

  pub fn kind(&self) -> EntityKind {
    match self {
      Self::Issue { .. } => EntityKind::Issue,
      Self::ActiveSprint { .. } => EntityKind::ActiveSprint,
      Self::UserIssues { .. } => EntityKind::UserIssues,
      Self::PullRequest { .. } => EntityKind::PullRequest,
      Self::Branches { .. } => EntityKind::Branches,
    }
  }

  pub fn ttl(&self) -> Duration {
    self.kind().ttl()
  }

  /// The flat string key stored in the fast cache.
  pub fn as_key(&self) -> String {
    match self {
      Self::Issue { issue_key } => format!("{}:issue:{}", JIRA_PREFIX, issue_key),
      Self::ActiveSprint { project_key } => {
        format!("{}:sprint:active:{}", JIRA_PREFIX, project_key)
      }
      Self::UserIssues { email } => {
        let encoded: String = form_urlencoded::byte_serialize(email.as_bytes()).collect();
        format!("{}:user:{}:issues", JIRA_PREFIX, encoded)
      }
      Self::PullRequest { repo_slug, pr_id } => {
        format!("{}:pr:{}:{}", BITBUCKET_PREFIX, repo_slug, pr_id)
      }
      Self::Branches { repo_slug } => format!("{}:repo:{}:branches", BITBUCKET_PREFIX, repo_slug),
    }
  }
}

impl std::fmt::Display for CacheKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.as_key())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_key_layout() {
    assert_eq!(CacheKey::issue("PROJ-123").as_key(), "jira:issue:PROJ-123");
    assert_eq!(
      CacheKey::active_sprint("PROJ").as_key(),
      "jira:sprint:active:PROJ"
    );
    assert_eq!(
      CacheKey::pull_request("api", 42).as_key(),
      "bb:pr:api:42"
    );
    assert_eq!(CacheKey::branches("api").as_key(), "bb:repo:api:branches");
  }

  #[test]
  fn test_user_key_encodes_email() {
    assert_eq!(
      CacheKey::user_issues("dev@acme.io").as_key(),
      "jira:user:dev%40acme.io:issues"
    );
  }

  #[test]
  fn test_ttl_table() {
    assert_eq!(CacheKey::issue("A-1").ttl().as_secs(), 300);
    assert_eq!(CacheKey::active_sprint("A").ttl().as_secs(), 600);
    assert_eq!(CacheKey::user_issues("a@b.c").ttl().as_secs(), 120);
    assert_eq!(CacheKey::pull_request("r", 1).ttl().as_secs(), 180);
    assert_eq!(CacheKey::branches("r").ttl().as_secs(), 900);
    assert_eq!(EntityKind::Project.ttl().as_secs(), 3600);
    assert_eq!(EntityKind::Commits.ttl().as_secs(), 300);
    assert_eq!(EntityKind::Repositories.ttl().as_secs(), 600);
  }
}
