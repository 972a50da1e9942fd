//! Serde-deserializable types matching Jira REST v3 responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs. Every nested
//! field is optional; missing pieces become `None` or empty in the domain
//! model instead of failing the whole payload.

use serde::Deserialize;

// ============================================================================
// Common nested field types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiNamed {
  pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  #[serde(rename = "displayName")]
  pub display_name: Option<String>,
  #[serde(rename = "emailAddress")]
  pub email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiProjectRef {
  pub key: Option<String>,
}

// ============================================================================
// Issue
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiIssueFields {
  pub summary: Option<String>,
  pub status: Option<ApiNamed>,
  #[serde(rename = "issuetype")]
  pub issue_type: Option<ApiNamed>,
  pub priority: Option<ApiNamed>,
  pub assignee: Option<ApiUser>,
  pub reporter: Option<ApiUser>,
  pub project: Option<ApiProjectRef>,
  pub labels: Option<Vec<String>>,
  pub created: Option<String>,
  pub updated: Option<String>,
  // Plain string (v2) or an ADF document (v3), handled by the normalizer
  pub description: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssue {
  #[serde(default)]
  pub id: String,
  pub key: String,
  #[serde(default)]
  pub fields: ApiIssueFields,
}

// ============================================================================
// Search endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiSearchResponse {
  #[serde(default)]
  pub issues: Vec<ApiIssue>,
  #[serde(rename = "startAt", default)]
  pub start_at: u64,
  #[serde(rename = "maxResults", default)]
  pub max_results: u64,
  #[serde(default)]
  pub total: u64,
}

// ============================================================================
// Project and server info
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiProject {
  #[serde(default)]
  pub id: String,
  pub key: String,
  #[serde(default)]
  pub name: String,
  pub description: Option<String>,
  pub lead: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
pub struct ApiServerInfo {
  #[serde(rename = "serverTitle")]
  pub server_title: Option<String>,
  pub version: Option<String>,
  #[serde(rename = "baseUrl")]
  pub base_url: Option<String>,
}
