use std::future::Future;
use std::time::Duration;

use crate::config::JiraConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;
use crate::jira::api_types::{ApiIssue, ApiProject, ApiSearchResponse, ApiServerInfo};
use crate::jira::types::{Issue, Project, SearchOptions, SearchResult};
use crate::response::ConnectionInfo;

const API_PREFIX: [&str; 3] = ["rest", "api", "3"];

/// Operations the Jira facade needs from the issue tracker.
pub trait IssueTracker: Send + Sync + 'static {
  /// Probe `/serverInfo`.
  fn test_connection(&self) -> impl Future<Output = ClientResult<ConnectionInfo>> + Send;

  fn get_project(&self, key: &str) -> impl Future<Output = ClientResult<Project>> + Send;

  fn find_issue(&self, key: &str) -> impl Future<Output = ClientResult<Issue>> + Send;

  /// Run `jql` unchanged and return one page.
  fn search(
    &self,
    jql: &str,
    options: SearchOptions,
  ) -> impl Future<Output = ClientResult<SearchResult>> + Send;
}

/// Jira REST v3 client
///
/// Construction never fails. Without a host, email and token (or with an
/// unusable URL) the client is disabled and every call returns
/// [`ClientError::NotConfigured`].
#[derive(Clone)]
pub struct JiraClient {
  http: Option<HttpClient>,
  base_url: Option<String>,
}

impl JiraClient {
  pub fn new(config: &JiraConfig, timeout: Duration) -> Self {
    let (Some(base_url), Some(email), Some(token)) =
      (config.base_url(), &config.email, &config.api_token)
    else {
      tracing::warn!("Jira credentials missing, client disabled");
      return Self::disabled();
    };

    match HttpClient::new(&base_url, email, token, timeout) {
      Ok(http) => Self {
        http: Some(http),
        base_url: Some(base_url),
      },
      Err(e) => {
        tracing::warn!(error = %e, "Jira client could not be created, client disabled");
        Self::disabled()
      }
    }
  }

  pub fn disabled() -> Self {
    Self {
      http: None,
      base_url: None,
    }
  }

  pub fn is_configured(&self) -> bool {
    self.http.is_some()
  }

  /// Site URL used for browse links
  pub fn base_url(&self) -> Option<&str> {
    self.base_url.as_deref()
  }

  fn http(&self) -> ClientResult<&HttpClient> {
    self.http.as_ref().ok_or(ClientError::NotConfigured("jira"))
  }

  async fn get<T: serde::de::DeserializeOwned>(
    &self,
    path: &[&str],
    query: &[(&str, String)],
  ) -> ClientResult<T> {
    let http = self.http()?;
    let segments: Vec<&str> = API_PREFIX.iter().copied().chain(path.iter().copied()).collect();
    http.get_json(&segments, query).await
  }
}

impl IssueTracker for JiraClient {
  async fn test_connection(&self) -> ClientResult<ConnectionInfo> {
    let info: ApiServerInfo = self.get(&["serverInfo"], &[]).await?;
    Ok(info.into())
  }

  async fn get_project(&self, key: &str) -> ClientResult<Project> {
    let project: ApiProject = self.get(&["project", key], &[]).await?;
    Ok(project.into())
  }

  async fn find_issue(&self, key: &str) -> ClientResult<Issue> {
    let issue: ApiIssue = self.get(&["issue", key], &[]).await?;
    Ok(issue.normalize(self.base_url()))
  }

  async fn search(&self, jql: &str, options: SearchOptions) -> ClientResult<SearchResult> {
    let query = [
      ("jql", jql.to_string()),
      ("maxResults", options.max_results.to_string()),
      ("startAt", options.start_at.to_string()),
    ];
    let response: ApiSearchResponse = self.get(&["search"], &query).await?;
    Ok(response.normalize(self.base_url()))
  }
}
