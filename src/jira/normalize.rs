//! Conversions from Jira API payloads to domain types.

use super::api_types::{ApiIssue, ApiProject, ApiSearchResponse, ApiServerInfo, ApiUser};
use super::types::{Issue, Project, SearchResult};
use crate::response::ConnectionInfo;

impl ApiIssue {
  /// Flatten the nested issue fields. `base_url` is the Jira site
  /// (e.g. "https://acme.atlassian.net"); when known, the issue gets a
  /// browser URL.
  pub fn normalize(self, base_url: Option<&str>) -> Issue {
    let f = self.fields;
    let project_key = f
      .project
      .and_then(|p| p.key)
      .unwrap_or_else(|| project_key_from_issue_key(&self.key));

    Issue {
      url: base_url.map(|base| browse_url(base, &self.key)),
      id: self.id,
      project_key,
      summary: f.summary.unwrap_or_default(),
      description: f.description.as_ref().and_then(extract_description),
      status: f.status.and_then(|s| s.name).unwrap_or_default(),
      issue_type: f.issue_type.and_then(|t| t.name).unwrap_or_default(),
      priority: f.priority.and_then(|p| p.name),
      assignee: f.assignee.and_then(user_label),
      reporter: f.reporter.and_then(user_label),
      labels: f.labels.unwrap_or_default(),
      created: f.created.unwrap_or_default(),
      updated: f.updated.unwrap_or_default(),
      key: self.key,
    }
  }
}

impl ApiSearchResponse {
  pub fn normalize(self, base_url: Option<&str>) -> SearchResult {
    SearchResult {
      issues: self
        .issues
        .into_iter()
        .map(|issue| issue.normalize(base_url))
        .collect(),
      total: self.total,
      max_results: self.max_results,
      start_at: self.start_at,
    }
  }
}

impl From<ApiProject> for Project {
  fn from(project: ApiProject) -> Self {
    Project {
      id: project.id,
      key: project.key,
      name: project.name,
      description: project.description,
      lead: project.lead.and_then(user_label),
    }
  }
}

impl From<ApiServerInfo> for ConnectionInfo {
  fn from(info: ApiServerInfo) -> Self {
    let title = info
      .server_title
      .clone()
      .or(info.base_url)
      .unwrap_or_else(|| "Jira".to_string());
    ConnectionInfo {
      server_title: info.server_title,
      version: info.version,
      ..ConnectionInfo::connected(format!("Successfully connected to {}", title))
    }
  }
}

/// Human link to an issue: `<base>/browse/<KEY>`.
pub fn browse_url(base_url: &str, issue_key: &str) -> String {
  format!("{}/browse/{}", base_url.trim_end_matches('/'), issue_key)
}

/// True for keys shaped like `PROJ-123`.
pub fn is_valid_issue_key(key: &str) -> bool {
  let Some((project, number)) = key.split_once('-') else {
    return false;
  };
  !project.is_empty()
    && project.chars().all(|c| c.is_ascii_uppercase())
    && !number.is_empty()
    && number.chars().all(|c| c.is_ascii_digit())
}

fn project_key_from_issue_key(issue_key: &str) -> String {
  issue_key
    .rsplit_once('-')
    .map(|(project, _)| project.to_string())
    .unwrap_or_default()
}

/// Email when visible, display name otherwise.
fn user_label(user: ApiUser) -> Option<String> {
  user.email_address.or(user.display_name)
}

/// Extract plain text description from Jira's ADF or plain text format
fn extract_description(value: &serde_json::Value) -> Option<String> {
  // If it's a string, return it directly (API v2)
  if let Some(s) = value.as_str() {
    return Some(s.to_string());
  }

  // If it's an ADF document (API v3), extract text content
  if let Some(content) = value.get("content").and_then(|v| v.as_array()) {
    let mut text = String::new();
    extract_adf_text(content, &mut text);
    let text = text.trim_end_matches('\n');
    if !text.is_empty() {
      return Some(text.to_string());
    }
  }

  None
}

/// Recursively extract text from ADF content
fn extract_adf_text(content: &[serde_json::Value], output: &mut String) {
  for node in content {
    let Some(node_type) = node.get("type").and_then(|v| v.as_str()) else {
      continue;
    };

    match node_type {
      "text" => {
        if let Some(text) = node.get("text").and_then(|v| v.as_str()) {
          output.push_str(text);
        }
      }
      "hardBreak" => output.push('\n'),
      _ => {
        if let Some(children) = node.get("content").and_then(|v| v.as_array()) {
          extract_adf_text(children, output);
        }
        if matches!(node_type, "paragraph" | "heading" | "codeBlock") {
          output.push('\n');
        }
      }
    }
  }
}
