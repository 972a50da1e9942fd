use std::future::Future;
use std::time::Duration;

use crate::bitbucket::api_types::{
  ApiBranch, ApiCommit, ApiPage, ApiPullRequest, ApiRepository, ApiWorkspace,
};
use crate::bitbucket::types::{
  Branch, Commit, CreatePullRequest, PrState, PullRequest, Repository,
};
use crate::config::BitbucketConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;
use crate::response::ConnectionInfo;

/// Page size for list endpoints
pub const PAGE_LEN: u32 = 50;
/// Largest page Bitbucket serves
pub const MAX_PAGE_LEN: u32 = 100;

/// Operations the Bitbucket facade needs from the code host.
pub trait CodeHost: Send + Sync + 'static {
  /// Workspace the client is bound to, `None` when disabled.
  fn workspace(&self) -> Option<&str>;

  /// Probe the configured workspace.
  fn test_connection(&self) -> impl Future<Output = ClientResult<ConnectionInfo>> + Send;

  fn list_repositories(&self) -> impl Future<Output = ClientResult<Vec<Repository>>> + Send;

  fn list_pull_requests(
    &self,
    repo_slug: &str,
    state: PrState,
  ) -> impl Future<Output = ClientResult<Vec<PullRequest>>> + Send;

  fn create_pull_request(
    &self,
    payload: &CreatePullRequest,
  ) -> impl Future<Output = ClientResult<PullRequest>> + Send;

  fn get_pull_request(
    &self,
    repo_slug: &str,
    pr_id: u64,
  ) -> impl Future<Output = ClientResult<PullRequest>> + Send;

  fn get_branches(&self, repo_slug: &str) -> impl Future<Output = ClientResult<Vec<Branch>>> + Send;

  /// Newest first. `limit` is capped at [`MAX_PAGE_LEN`]; zero asks for
  /// nothing and makes no upstream call.
  fn get_commits(
    &self,
    repo_slug: &str,
    branch: Option<&str>,
    limit: u32,
  ) -> impl Future<Output = ClientResult<Vec<Commit>>> + Send;
}

/// Bitbucket Cloud 2.0 client
///
/// Construction never fails. Without a workspace, username and app password
/// the client is disabled and every call returns
/// [`ClientError::NotConfigured`].
#[derive(Clone)]
pub struct BitbucketClient {
  http: Option<HttpClient>,
  workspace: String,
}

impl BitbucketClient {
  pub fn new(config: &BitbucketConfig, timeout: Duration) -> Self {
    let (Some(workspace), Some(username), Some(password)) =
      (&config.workspace, &config.username, &config.app_password)
    else {
      tracing::warn!("Bitbucket credentials missing, client disabled");
      return Self::disabled();
    };

    match HttpClient::new(&config.api_base(), username, password, timeout) {
      Ok(http) => {
        tracing::info!(workspace = %workspace, "Bitbucket client initialised");
        Self {
          http: Some(http),
          workspace: workspace.clone(),
        }
      }
      Err(e) => {
        tracing::warn!(error = %e, "Bitbucket client could not be created, client disabled");
        Self::disabled()
      }
    }
  }

  pub fn disabled() -> Self {
    Self {
      http: None,
      workspace: String::new(),
    }
  }

  pub fn is_configured(&self) -> bool {
    self.http.is_some()
  }

  fn http(&self) -> ClientResult<&HttpClient> {
    self.http.as_ref().ok_or(ClientError::NotConfigured("bitbucket"))
  }

  /// GET under `repositories/<workspace>/<repo_slug>/...`
  async fn get_repo<T: serde::de::DeserializeOwned>(
    &self,
    repo_slug: &str,
    path: &[&str],
    query: &[(&str, String)],
  ) -> ClientResult<T> {
    let http = self.http()?;
    let mut segments = vec!["repositories", self.workspace.as_str(), repo_slug];
    segments.extend_from_slice(path);
    http.get_json(&segments, query).await
  }

  async fn main_branch(&self, repo_slug: &str) -> ClientResult<Option<String>> {
    let repo: ApiRepository = self.get_repo(repo_slug, &[], &[]).await?;
    Ok(repo.mainbranch.and_then(|b| b.name))
  }
}

fn page_query(pagelen: u32) -> (&'static str, String) {
  ("pagelen", pagelen.min(MAX_PAGE_LEN).to_string())
}

impl CodeHost for BitbucketClient {
  fn workspace(&self) -> Option<&str> {
    self.http.as_ref().map(|_| self.workspace.as_str())
  }

  async fn test_connection(&self) -> ClientResult<ConnectionInfo> {
    let http = self.http()?;
    let workspace: ApiWorkspace = http
      .get_json(&["workspaces", self.workspace.as_str()], &[])
      .await?;
    Ok(workspace.into_connection_info(&self.workspace))
  }

  async fn list_repositories(&self) -> ClientResult<Vec<Repository>> {
    let http = self.http()?;
    let page: ApiPage<ApiRepository> = http
      .get_json(&["repositories", self.workspace.as_str()], &[page_query(PAGE_LEN)])
      .await?;
    Ok(page.values.into_iter().map(Repository::from).collect())
  }

  async fn list_pull_requests(
    &self,
    repo_slug: &str,
    state: PrState,
  ) -> ClientResult<Vec<PullRequest>> {
    let query = [("state", state.as_str().to_string()), page_query(PAGE_LEN)];
    let page: ApiPage<ApiPullRequest> =
      self.get_repo(repo_slug, &["pullrequests"], &query).await?;
    Ok(
      page
        .values
        .into_iter()
        .map(|pr| pr.normalize(repo_slug))
        .collect(),
    )
  }

  async fn create_pull_request(&self, payload: &CreatePullRequest) -> ClientResult<PullRequest> {
    let http = self.http()?;
    let segments = [
      "repositories",
      self.workspace.as_str(),
      payload.repo_slug.as_str(),
      "pullrequests",
    ];
    let created: ApiPullRequest = http.post_json(&segments, &payload.to_api()).await?;
    Ok(created.normalize(&payload.repo_slug))
  }

  async fn get_pull_request(&self, repo_slug: &str, pr_id: u64) -> ClientResult<PullRequest> {
    let id = pr_id.to_string();
    let pr: ApiPullRequest = self
      .get_repo(repo_slug, &["pullrequests", id.as_str()], &[])
      .await?;
    Ok(pr.normalize(repo_slug))
  }

  /// Branches plus the repository's main branch, fetched concurrently, so
  /// `is_default` can be set. A failed repository lookup only loses the flag.
  async fn get_branches(&self, repo_slug: &str) -> ClientResult<Vec<Branch>> {
    let branches_query = [page_query(PAGE_LEN)];
    let (branches, main_branch) = tokio::join!(
      self.get_repo::<ApiPage<ApiBranch>>(repo_slug, &["refs", "branches"], &branches_query),
      self.main_branch(repo_slug),
    );

    let main_branch = main_branch.unwrap_or_else(|e| {
      tracing::warn!(error = %e, repo_slug, "could not resolve main branch");
      None
    });

    Ok(
      branches?
        .values
        .into_iter()
        .map(|b| b.normalize(main_branch.as_deref()))
        .collect(),
    )
  }

  async fn get_commits(
    &self,
    repo_slug: &str,
    branch: Option<&str>,
    limit: u32,
  ) -> ClientResult<Vec<Commit>> {
    self.http()?;
    if limit == 0 {
      return Ok(Vec::new());
    }

    let mut query = vec![page_query(limit)];
    if let Some(branch) = branch {
      query.push(("include", branch.to_string()));
    }

    let page: ApiPage<ApiCommit> = self.get_repo(repo_slug, &["commits"], &query).await?;
    Ok(
      page
        .values
        .into_iter()
        .take(limit.min(MAX_PAGE_LEN) as usize)
        .map(Commit::from)
        .collect(),
    )
  }
}
