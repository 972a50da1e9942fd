//! Bitbucket read facade plus pull request creation.

use std::sync::Arc;

use crate::bitbucket::client::CodeHost;
use crate::bitbucket::types::{
  Branch, Commit, CreatePullRequest, PrState, PullRequest, Repository,
};
use crate::cache::{CacheKey, CacheLayer, DurableCache, FastCache};
use crate::error::{ClientError, ClientResult};
use crate::response::{respond, ConnectionInfo, Response};

/// Commits returned when the caller gives no limit
pub const DEFAULT_COMMIT_LIMIT: u32 = 30;

pub struct BitbucketService<C: CodeHost, F: FastCache> {
  client: Arc<C>,
  cache: CacheLayer<F>,
  durable: Option<Arc<DurableCache>>,
  default_repo: Option<String>,
}

impl<C: CodeHost, F: FastCache> BitbucketService<C, F> {
  pub fn new(client: Arc<C>, cache: CacheLayer<F>) -> Self {
    Self {
      client,
      cache,
      durable: None,
      default_repo: None,
    }
  }

  /// Mirror fetched pull requests into the durable cache.
  pub fn with_durable(mut self, durable: Option<Arc<DurableCache>>) -> Self {
    self.durable = durable;
    self
  }

  /// Repository used for operations called without one
  pub fn with_default_repo(mut self, repo_slug: Option<String>) -> Self {
    self.default_repo = repo_slug;
    self
  }

  pub fn workspace(&self) -> Option<&str> {
    self.client.workspace()
  }

  pub fn default_repo(&self) -> Option<&str> {
    self.default_repo.as_deref()
  }

  pub fn client(&self) -> &Arc<C> {
    &self.client
  }

  /// Probe the workspace. A rejected probe is data with `success: false`;
  /// only a disabled client is an error.
  pub async fn test_connection(&self) -> Response<ConnectionInfo> {
    match self.client.test_connection().await {
      Ok(info) => Response::Data(info),
      Err(err @ ClientError::NotConfigured(_)) => respond("test_connection", Err(err)),
      Err(err) => {
        tracing::warn!(error = %err, "Bitbucket connection test failed");
        Response::Data(ConnectionInfo {
          workspace: self.workspace().map(String::from),
          ..ConnectionInfo::failed(err.to_string())
        })
      }
    }
  }

  pub async fn list_repositories(&self) -> Response<Vec<Repository>> {
    let result = self.client.list_repositories().await;
    if let Ok(repos) = &result {
      tracing::info!(count = repos.len(), "repositories listed");
    }
    respond("list_repositories", result)
  }

  /// Pull requests in `state`. Not fast-cached; every returned pull request
  /// is mirrored to the durable cache.
  pub async fn list_pull_requests(
    &self,
    repo_slug: Option<&str>,
    state: PrState,
  ) -> Response<Vec<PullRequest>> {
    let result = match self.resolve_repo(repo_slug) {
      Ok(repo) => self.client.list_pull_requests(repo, state).await,
      Err(e) => Err(e),
    };

    if let Ok(prs) = &result {
      tracing::info!(count = prs.len(), state = %state, "pull requests listed");
      for pr in prs {
        self.mirror_pull_request(pr);
      }
    }
    respond("list_pull_requests", result)
  }

  /// Fetch one pull request through the fast cache. Fresh upstream reads are
  /// written to both cache tiers.
  #[tracing::instrument(skip(self), level = "debug")]
  pub async fn get_pr(&self, repo_slug: Option<&str>, pr_id: u64) -> Response<PullRequest> {
    let repo = match self.resolve_repo(repo_slug) {
      Ok(repo) => repo,
      Err(e) => return respond("get_pr", Err(e)),
    };

    let key = CacheKey::pull_request(repo, pr_id);
    let result = self
      .cache
      .fetch_one_or_durable(
        &key,
        || async {
          let pr = self.client.get_pull_request(repo, pr_id).await?;
          self.mirror_pull_request(&pr);
          Ok(pr)
        },
        || {
          // Rows are keyed by id alone, so check the repository matches
          let Some(durable) = &self.durable else {
            return Ok(None);
          };
          Ok(
            durable
              .get_pull_request(pr_id)?
              .filter(|row| row.entity.repo_slug == repo),
          )
        },
      )
      .await;
    respond("get_pr", result.map(|r| r.data))
  }

  /// Branch set for a repository, cached whole.
  pub async fn get_branches(&self, repo_slug: Option<&str>) -> Response<Vec<Branch>> {
    let repo = match self.resolve_repo(repo_slug) {
      Ok(repo) => repo,
      Err(e) => return respond("get_branches", Err(e)),
    };

    let result = self
      .cache
      .fetch_one(&CacheKey::branches(repo), || self.client.get_branches(repo))
      .await;
    respond("get_branches", result.map(|r| r.data))
  }

  /// Recent commits, optionally on `branch`. Not cached.
  pub async fn get_commits(
    &self,
    repo_slug: Option<&str>,
    branch: Option<&str>,
    limit: Option<u32>,
  ) -> Response<Vec<Commit>> {
    let result = match self.resolve_repo(repo_slug) {
      Ok(repo) => {
        let limit = limit.unwrap_or(DEFAULT_COMMIT_LIMIT);
        self.client.get_commits(repo, branch, limit).await
      }
      Err(e) => Err(e),
    };
    respond("get_commits", result)
  }

  /// Open a pull request. The created pull request is mirrored to the
  /// durable cache and primes the fast cache.
  pub async fn create_pull_request(&self, payload: &CreatePullRequest) -> Response<PullRequest> {
    let result = self.client.create_pull_request(payload).await;
    if let Ok(pr) = &result {
      tracing::info!(pr_id = pr.id, repo_slug = %pr.repo_slug, "pull request created");
      self.mirror_pull_request(pr);
      self
        .cache
        .write(&CacheKey::pull_request(&pr.repo_slug, pr.id), pr)
        .await;
    }
    respond("create_pull_request", result)
  }

  /// Drop the fast-cache copy so the next read goes upstream.
  pub async fn invalidate_pr(&self, repo_slug: &str, pr_id: u64) {
    self
      .cache
      .invalidate(&CacheKey::pull_request(repo_slug, pr_id))
      .await;
  }

  fn resolve_repo<'a>(&'a self, repo_slug: Option<&'a str>) -> ClientResult<&'a str> {
    repo_slug
      .or(self.default_repo())
      .ok_or(ClientError::NotConfigured("bitbucket default repo"))
  }

  fn mirror_pull_request(&self, pr: &PullRequest) {
    if let Some(durable) = &self.durable {
      if let Err(e) = durable.upsert_pull_request(pr) {
        tracing::warn!(
          error = %e,
          pr_id = pr.id,
          repo_slug = %pr.repo_slug,
          "durable cache write failed"
        );
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryCache;
  use std::sync::atomic::{AtomicU32, Ordering};

  #[derive(Default)]
  struct CountingHost {
    branch_calls: AtomicU32,
    commit_limits: std::sync::Mutex<Vec<u32>>,
  }

  fn pr(id: u64, repo: &str) -> PullRequest {
    PullRequest {
      id,
      repo_slug: repo.to_string(),
      title: format!("PR {}", id),
      description: None,
      state: PrState::Open,
      author: None,
      source_branch: "feature".to_string(),
      destination_branch: "main".to_string(),
      created_on: String::new(),
      updated_on: String::new(),
      comment_count: None,
      reviewers: vec![],
    }
  }

  impl CodeHost for CountingHost {
    fn workspace(&self) -> Option<&str> {
      Some("acme")
    }

    async fn test_connection(&self) -> ClientResult<ConnectionInfo> {
      Err(ClientError::Http {
        status: 403,
        message: "Forbidden".to_string(),
      })
    }

    async fn list_repositories(&self) -> ClientResult<Vec<Repository>> {
      Ok(vec![])
    }

    async fn list_pull_requests(
      &self,
      repo_slug: &str,
      _state: PrState,
    ) -> ClientResult<Vec<PullRequest>> {
      Ok(vec![pr(1, repo_slug), pr(2, repo_slug)])
    }

    async fn create_pull_request(&self, payload: &CreatePullRequest) -> ClientResult<PullRequest> {
      Ok(PullRequest {
        title: payload.title.clone(),
        ..pr(10, &payload.repo_slug)
      })
    }

    async fn get_pull_request(&self, repo_slug: &str, pr_id: u64) -> ClientResult<PullRequest> {
      Ok(pr(pr_id, repo_slug))
    }

    async fn get_branches(&self, _repo_slug: &str) -> ClientResult<Vec<Branch>> {
      self.branch_calls.fetch_add(1, Ordering::SeqCst);
      Ok(vec![Branch {
        name: "main".to_string(),
        is_default: true,
        latest_commit: None,
      }])
    }

    async fn get_commits(
      &self,
      _repo_slug: &str,
      _branch: Option<&str>,
      limit: u32,
    ) -> ClientResult<Vec<Commit>> {
      self.commit_limits.lock().unwrap().push(limit);
      Ok(vec![])
    }
  }

  fn service() -> BitbucketService<CountingHost, MemoryCache> {
    BitbucketService::new(
      Arc::new(CountingHost::default()),
      CacheLayer::new(Arc::new(MemoryCache::new())),
    )
    .with_default_repo(Some("api".to_string()))
  }

  #[tokio::test]
  async fn test_list_pull_requests_mirrors_to_durable() {
    let durable = Arc::new(DurableCache::open_in_memory().unwrap());
    let svc = service().with_durable(Some(Arc::clone(&durable)));

    let response = svc.list_pull_requests(None, PrState::Open).await;
    assert_eq!(response.data().map(|prs| prs.len()), Some(2));
    assert!(durable.get_pull_request(1).unwrap().is_some());
    assert!(durable.get_pull_request(2).unwrap().is_some());
  }

  #[tokio::test]
  async fn test_branches_are_cached_per_repo() {
    let svc = service();
    svc.get_branches(None).await;
    svc.get_branches(Some("api")).await;
    svc.get_branches(Some("web")).await;
    assert_eq!(svc.client().branch_calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_commit_limit_default() {
    let svc = service();
    svc.get_commits(None, None, None).await;
    svc.get_commits(None, Some("develop"), Some(5)).await;
    assert_eq!(*svc.client().commit_limits.lock().unwrap(), vec![30, 5]);
  }

  #[tokio::test]
  async fn test_create_primes_fast_cache() {
    let svc = service();
    let payload = CreatePullRequest {
      repo_slug: "web".to_string(),
      title: "New".to_string(),
      description: None,
      source_branch: "feature".to_string(),
      destination_branch: "main".to_string(),
      close_source_branch: false,
    };

    let created = svc.create_pull_request(&payload).await;
    assert_eq!(created.data().map(|pr| pr.id), Some(10));

    let fast = svc.cache.fast_cache();
    assert!(fast.get("bb:pr:web:10").await.unwrap().is_some());
  }

  #[tokio::test]
  async fn test_missing_repo_is_an_error() {
    let svc = service().with_default_repo(None);
    let response = svc.get_branches(None).await;
    assert_eq!(response.error(), Some("bitbucket default repo not configured"));
  }

  #[tokio::test]
  async fn test_failed_connection_check_is_data() {
    let svc = service();
    let info = svc.test_connection().await.into_data().unwrap();
    assert!(!info.success);
    assert_eq!(info.message, "Forbidden");
    assert_eq!(info.workspace.as_deref(), Some("acme"));
  }
}
