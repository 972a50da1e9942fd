//! Fake upstreams and cache wrappers shared by the facade tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chatops_bridge::bitbucket::{
  Branch, CodeHost, Commit, CreatePullRequest, PrState, PullRequest, Repository,
};
use chatops_bridge::cache::{DurableCache, FastCache, MemoryCache};
use chatops_bridge::jira::{IssueTracker, Issue, Project, SearchOptions, SearchResult};
use chatops_bridge::{ClientError, ClientResult, ConnectionInfo};
use color_eyre::eyre::eyre;

pub fn issue(key: &str, summary: &str) -> Issue {
  Issue {
    id: "10001".to_string(),
    key: key.to_string(),
    project_key: key.split('-').next().unwrap_or_default().to_string(),
    summary: summary.to_string(),
    description: None,
    status: "To Do".to_string(),
    issue_type: "Task".to_string(),
    priority: None,
    assignee: None,
    reporter: None,
    labels: vec![],
    created: "2024-01-01T00:00:00.000+0000".to_string(),
    updated: "2024-01-01T00:00:00.000+0000".to_string(),
    url: None,
  }
}

pub fn pull_request(repo: &str, id: u64) -> PullRequest {
  PullRequest {
    id,
    repo_slug: repo.to_string(),
    title: format!("PR {}", id),
    description: None,
    state: PrState::Open,
    author: Some("Dana".to_string()),
    source_branch: "feature".to_string(),
    destination_branch: "main".to_string(),
    created_on: "2024-02-01T09:00:00+00:00".to_string(),
    updated_on: "2024-02-01T09:00:00+00:00".to_string(),
    comment_count: None,
    reviewers: vec![],
  }
}

fn unavailable() -> ClientError {
  ClientError::Http {
    status: 503,
    message: "Service Unavailable".to_string(),
  }
}

/// Issue tracker that counts calls and records JQL.
#[derive(Default)]
pub struct FakeTracker {
  pub issue_calls: AtomicU32,
  pub queries: Mutex<Vec<String>>,
  pub summary: Mutex<Option<String>>,
  pub failing: std::sync::atomic::AtomicBool,
}

impl FakeTracker {
  pub fn with_summary(summary: &str) -> Self {
    let tracker = Self::default();
    *tracker.summary.lock().unwrap() = Some(summary.to_string());
    tracker
  }

  pub fn issue_calls(&self) -> u32 {
    self.issue_calls.load(Ordering::SeqCst)
  }

  pub fn queries(&self) -> Vec<String> {
    self.queries.lock().unwrap().clone()
  }

  pub fn fail(&self) {
    self.failing.store(true, Ordering::SeqCst);
  }
}

impl IssueTracker for FakeTracker {
  async fn test_connection(&self) -> ClientResult<ConnectionInfo> {
    Ok(ConnectionInfo::connected("Successfully connected to Fake"))
  }

  async fn get_project(&self, key: &str) -> ClientResult<Project> {
    Ok(Project {
      id: "1".to_string(),
      key: key.to_string(),
      name: key.to_string(),
      description: None,
      lead: None,
    })
  }

  async fn find_issue(&self, key: &str) -> ClientResult<Issue> {
    self.issue_calls.fetch_add(1, Ordering::SeqCst);
    if self.failing.load(Ordering::SeqCst) {
      return Err(unavailable());
    }
    let summary = self
      .summary
      .lock()
      .unwrap()
      .clone()
      .unwrap_or_else(|| "Test".to_string());
    Ok(issue(key, &summary))
  }

  async fn search(&self, jql: &str, options: SearchOptions) -> ClientResult<SearchResult> {
    self.queries.lock().unwrap().push(jql.to_string());
    Ok(SearchResult {
      issues: vec![],
      total: 0,
      max_results: options.max_results as u64,
      start_at: options.start_at as u64,
    })
  }
}

/// Code host that counts pull request fetches.
#[derive(Default)]
pub struct FakeHost {
  pub pr_calls: AtomicU32,
  pub failing: std::sync::atomic::AtomicBool,
}

impl FakeHost {
  pub fn pr_calls(&self) -> u32 {
    self.pr_calls.load(Ordering::SeqCst)
  }

  pub fn fail(&self) {
    self.failing.store(true, Ordering::SeqCst);
  }
}

impl CodeHost for FakeHost {
  fn workspace(&self) -> Option<&str> {
    Some("acme")
  }

  async fn test_connection(&self) -> ClientResult<ConnectionInfo> {
    Ok(ConnectionInfo::connected("Successfully connected to workspace acme"))
  }

  async fn list_repositories(&self) -> ClientResult<Vec<Repository>> {
    Ok(vec![])
  }

  async fn list_pull_requests(
    &self,
    repo_slug: &str,
    _state: PrState,
  ) -> ClientResult<Vec<PullRequest>> {
    Ok(vec![pull_request(repo_slug, 1)])
  }

  async fn create_pull_request(&self, payload: &CreatePullRequest) -> ClientResult<PullRequest> {
    Ok(pull_request(&payload.repo_slug, 99))
  }

  async fn get_pull_request(&self, repo_slug: &str, pr_id: u64) -> ClientResult<PullRequest> {
    self.pr_calls.fetch_add(1, Ordering::SeqCst);
    if self.failing.load(Ordering::SeqCst) {
      return Err(unavailable());
    }
    Ok(pull_request(repo_slug, pr_id))
  }

  async fn get_branches(&self, _repo_slug: &str) -> ClientResult<Vec<Branch>> {
    Ok(vec![])
  }

  async fn get_commits(
    &self,
    _repo_slug: &str,
    _branch: Option<&str>,
    _limit: u32,
  ) -> ClientResult<Vec<Commit>> {
    Ok(vec![])
  }
}

/// Memory cache that records every write.
#[derive(Default)]
pub struct SpyCache {
  pub inner: MemoryCache,
  pub writes: Mutex<Vec<(String, Duration)>>,
}

impl SpyCache {
  pub fn writes(&self) -> Vec<(String, Duration)> {
    self.writes.lock().unwrap().clone()
  }
}

impl FastCache for SpyCache {
  async fn get(&self, key: &str) -> color_eyre::Result<Option<Vec<u8>>> {
    self.inner.get(key).await
  }

  async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> color_eyre::Result<()> {
    self.writes.lock().unwrap().push((key.to_string(), ttl));
    self.inner.set(key, value, ttl).await
  }

  async fn delete(&self, key: &str) -> color_eyre::Result<()> {
    self.inner.delete(key).await
  }
}

/// Fast cache whose every operation fails.
pub struct BrokenCache;

impl FastCache for BrokenCache {
  async fn get(&self, _key: &str) -> color_eyre::Result<Option<Vec<u8>>> {
    Err(eyre!("connection refused"))
  }

  async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> color_eyre::Result<()> {
    Err(eyre!("connection refused"))
  }

  async fn delete(&self, _key: &str) -> color_eyre::Result<()> {
    Err(eyre!("connection refused"))
  }
}

/// Durable cache whose tables are dropped behind its back, so every write
/// and read fails.
pub fn broken_durable(dir: &std::path::Path) -> DurableCache {
  let path = dir.join("cache.db");
  let durable = DurableCache::open(Some(&path)).unwrap();
  rusqlite::Connection::open(&path)
    .unwrap()
    .execute_batch("DROP TABLE jira_issue_cache; DROP TABLE bitbucket_pr_cache;")
    .unwrap();
  durable
}

pub fn shared<T>(value: T) -> Arc<T> {
  Arc::new(value)
}
