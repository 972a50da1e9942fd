//! Jira read facade: cache-aside reads that always answer with a [`Response`].

use std::sync::Arc;

use crate::cache::{CacheKey, CacheLayer, DurableCache, FastCache};
use crate::error::{ClientError, ClientResult};
use crate::jira::client::IssueTracker;
use crate::jira::jql::{JqlBuilder, SortOrder};
use crate::jira::types::{Issue, Project, SearchOptions, SearchResult};
use crate::response::{respond, ConnectionInfo, Response};

const TEXT_SEARCH_LIMIT: u32 = 20;
const ASSIGNED_LIMIT: u32 = 50;
const ACTIVE_SPRINT_LIMIT: u32 = 100;
const DONE: [&str; 1] = ["Done"];

pub struct JiraService<C: IssueTracker, F: FastCache> {
  client: Arc<C>,
  cache: CacheLayer<F>,
  durable: Option<Arc<DurableCache>>,
  project_key: Option<String>,
  email: Option<String>,
}

impl<C: IssueTracker, F: FastCache> JiraService<C, F> {
  pub fn new(client: Arc<C>, cache: CacheLayer<F>) -> Self {
    Self {
      client,
      cache,
      durable: None,
      project_key: None,
      email: None,
    }
  }

  /// Mirror fetched issues into the durable cache.
  pub fn with_durable(mut self, durable: Option<Arc<DurableCache>>) -> Self {
    self.durable = durable;
    self
  }

  /// Default project for operations called without one
  pub fn with_project_key(mut self, project_key: Option<String>) -> Self {
    self.project_key = project_key;
    self
  }

  /// Identity used by [`Self::get_assigned_to_me`]
  pub fn with_email(mut self, email: Option<String>) -> Self {
    self.email = email;
    self
  }

  pub fn configured_project_key(&self) -> Option<&str> {
    self.project_key.as_deref()
  }

  pub fn client(&self) -> &Arc<C> {
    &self.client
  }

  /// Probe the server. An unreachable or rejecting server is reported as
  /// data with `success: false`; only a disabled client is an error.
  pub async fn test_connection(&self) -> Response<ConnectionInfo> {
    match self.client.test_connection().await {
      Ok(info) => Response::Data(info),
      Err(err @ ClientError::NotConfigured(_)) => respond("test_connection", Err(err)),
      Err(err) => {
        tracing::warn!(error = %err, "Jira connection test failed");
        Response::Data(ConnectionInfo::failed(err.to_string()))
      }
    }
  }

  pub async fn get_project(&self, key: Option<&str>) -> Response<Project> {
    let result = match self.resolve_project(key) {
      Ok(key) => self.client.get_project(key).await,
      Err(e) => Err(e),
    };
    respond("get_project", result)
  }

  /// Fetch one issue through the fast cache. Fresh upstream reads are
  /// written to both cache tiers.
  #[tracing::instrument(skip(self), level = "debug")]
  pub async fn get_issue(&self, issue_key: &str) -> Response<Issue> {
    let key = CacheKey::issue(issue_key);
    let result = self
      .cache
      .fetch_one_or_durable(
        &key,
        || async {
          let issue = self.client.find_issue(issue_key).await?;
          self.mirror_issue(&issue);
          Ok(issue)
        },
        || match &self.durable {
          Some(durable) => durable.get_issue(issue_key),
          None => Ok(None),
        },
      )
      .await;
    respond("get_issue", result.map(|r| r.data))
  }

  /// Run caller JQL as-is. Never cached.
  pub async fn search_issues(
    &self,
    jql: &str,
    max_results: u32,
    start_at: u32,
  ) -> Response<SearchResult> {
    let result = self
      .client
      .search(jql, SearchOptions::new(max_results, start_at))
      .await;
    respond("search_issues", result)
  }

  /// Free-text search over summary and description of open issues.
  pub async fn search_by_text(
    &self,
    text: &str,
    project_key: Option<&str>,
  ) -> Response<SearchResult> {
    let mut builder = JqlBuilder::new().text_search(text);
    if let Some(project) = project_key.or(self.configured_project_key()) {
      builder = builder.project(project);
    }
    let jql = builder
      .not_in_status(DONE)
      .order_by("updated", SortOrder::Desc)
      .build();

    tracing::debug!(jql = %jql, "search by text");
    let result = self
      .client
      .search(&jql, SearchOptions::max_results(TEXT_SEARCH_LIMIT))
      .await;
    respond("search_by_text", result)
  }

  /// Open issues assigned to the configured email. Cached per email when
  /// the query targets the default project.
  pub async fn get_assigned_to_me(&self, project_key: Option<&str>) -> Response<SearchResult> {
    let Some(email) = self.email.as_deref() else {
      return Response::Error("email not configured".to_string());
    };

    let project = project_key.or(self.configured_project_key());
    let mut builder = JqlBuilder::new();
    if let Some(project) = project {
      builder = builder.project(project);
    }
    let jql = builder
      .assigned_to(email)
      .not_in_status(DONE)
      .order_by("updated", SortOrder::Desc)
      .build();
    let options = SearchOptions::max_results(ASSIGNED_LIMIT);

    let result = if project == self.configured_project_key() {
      self
        .cache
        .fetch_one(&CacheKey::user_issues(email), || {
          self.client.search(&jql, options)
        })
        .await
        .map(|r| r.data)
    } else {
      self.client.search(&jql, options).await
    };
    respond("get_assigned_to_me", result)
  }

  /// Open issues in the project's open sprints, cached per project.
  pub async fn get_active_sprint(&self, project_key: Option<&str>) -> Response<SearchResult> {
    let project = match self.resolve_project(project_key) {
      Ok(project) => project,
      Err(e) => return respond("get_active_sprint", Err(e)),
    };

    let jql = JqlBuilder::new()
      .project(project)
      .in_open_sprints()
      .not_in_status(DONE)
      .order_by("priority", SortOrder::Desc)
      .build();

    let result = self
      .cache
      .fetch_one(&CacheKey::active_sprint(project), || {
        self
          .client
          .search(&jql, SearchOptions::max_results(ACTIVE_SPRINT_LIMIT))
      })
      .await;
    respond("get_active_sprint", result.map(|r| r.data))
  }

  /// Open issues outside any sprint, newest first. Not cached.
  pub async fn get_backlog(&self, project_key: Option<&str>) -> Response<SearchResult> {
    let project = match self.resolve_project(project_key) {
      Ok(project) => project,
      Err(e) => return respond("get_backlog", Err(e)),
    };

    let jql = JqlBuilder::new()
      .project(project)
      .no_sprint()
      .not_in_status(DONE)
      .order_by("created", SortOrder::Desc)
      .build();

    let result = self.client.search(&jql, SearchOptions::default()).await;
    respond("get_backlog", result)
  }

  /// Drop the fast-cache copy so the next read goes upstream.
  pub async fn invalidate_issue(&self, issue_key: &str) {
    self.cache.invalidate(&CacheKey::issue(issue_key)).await;
  }

  fn resolve_project<'a>(&'a self, key: Option<&'a str>) -> ClientResult<&'a str> {
    key
      .or(self.configured_project_key())
      .ok_or(ClientError::NotConfigured("jira project key"))
  }

  fn mirror_issue(&self, issue: &Issue) {
    if let Some(durable) = &self.durable {
      if let Err(e) = durable.upsert_issue(issue) {
        tracing::warn!(error = %e, issue_key = %issue.key, "durable cache write failed");
      }
    }
  }
}
