//! Durable cache: last-known snapshots of issues and pull requests in SQLite.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::bitbucket::types::PullRequest;
use crate::jira::types::Issue;

/// A row read back from the durable cache.
#[derive(Debug, Clone)]
pub struct DurableRow<T> {
  /// The stored snapshot
  pub entity: T,
  /// When the snapshot was written
  pub last_updated: DateTime<Utc>,
}

impl<T> DurableRow<T> {
  /// True when the row is no older than `max_age` at `now`.
  pub fn is_within(&self, max_age: chrono::Duration, now: DateTime<Utc>) -> bool {
    now - self.last_updated <= max_age
  }
}

/// SQLite-backed durable cache.
///
/// One table per entity kind, each keyed by the upstream primary identifier,
/// holding the JSON payload plus a few indexable columns. Writes are upserts;
/// the last write wins.
pub struct DurableCache {
  conn: Mutex<Connection>,
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS jira_issue_cache (
    issue_key TEXT PRIMARY KEY,
    project_key TEXT NOT NULL,
    status TEXT NOT NULL,
    issue_data BLOB NOT NULL,
    last_updated TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_jira_issue_cache_project
    ON jira_issue_cache(project_key, status);

-- Pull request ids are keyed alone; repo_slug is a plain column
CREATE TABLE IF NOT EXISTS bitbucket_pr_cache (
    pr_id INTEGER PRIMARY KEY,
    repo_slug TEXT NOT NULL,
    state TEXT NOT NULL,
    pr_data BLOB NOT NULL,
    last_updated TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bitbucket_pr_cache_repo
    ON bitbucket_pr_cache(repo_slug, state);
"#;

impl DurableCache {
  /// Open (or create) the cache database at `path`, or at the default
  /// location when `path` is `None`.
  pub fn open(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open a private in-memory database. Contents vanish on drop.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("chatops-bridge").join("cache.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  pub fn upsert_issue(&self, issue: &Issue) -> Result<()> {
    self.upsert_issue_at(issue, Utc::now())
  }

  /// Upsert with an explicit snapshot time, for backfills.
  pub fn upsert_issue_at(&self, issue: &Issue, last_updated: DateTime<Utc>) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let data =
      serde_json::to_vec(issue).map_err(|e| eyre!("Failed to serialize issue: {}", e))?;

    conn
      .execute(
        "INSERT INTO jira_issue_cache (issue_key, project_key, status, issue_data, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(issue_key) DO UPDATE SET
           project_key = excluded.project_key,
           status = excluded.status,
           issue_data = excluded.issue_data,
           last_updated = excluded.last_updated",
        params![
          issue.key,
          issue.project_key,
          issue.status,
          data,
          last_updated.to_rfc3339()
        ],
      )
      .map_err(|e| eyre!("Failed to store issue {}: {}", issue.key, e))?;

    Ok(())
  }

  pub fn get_issue(&self, issue_key: &str) -> Result<Option<DurableRow<Issue>>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let row: Option<(Vec<u8>, String)> = conn
      .query_row(
        "SELECT issue_data, last_updated FROM jira_issue_cache WHERE issue_key = ?1",
        params![issue_key],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read issue {}: {}", issue_key, e))?;

    row
      .map(|(data, last_updated)| decode_row(&data, &last_updated))
      .transpose()
  }

  pub fn upsert_pull_request(&self, pr: &PullRequest) -> Result<()> {
    self.upsert_pull_request_at(pr, Utc::now())
  }

  pub fn upsert_pull_request_at(
    &self,
    pr: &PullRequest,
    last_updated: DateTime<Utc>,
  ) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let data =
      serde_json::to_vec(pr).map_err(|e| eyre!("Failed to serialize pull request: {}", e))?;

    conn
      .execute(
        "INSERT INTO bitbucket_pr_cache (pr_id, repo_slug, state, pr_data, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(pr_id) DO UPDATE SET
           repo_slug = excluded.repo_slug,
           state = excluded.state,
           pr_data = excluded.pr_data,
           last_updated = excluded.last_updated",
        params![
          pr.id as i64,
          pr.repo_slug,
          pr.state.as_str(),
          data,
          last_updated.to_rfc3339()
        ],
      )
      .map_err(|e| eyre!("Failed to store pull request {}: {}", pr.id, e))?;

    Ok(())
  }

  pub fn get_pull_request(&self, pr_id: u64) -> Result<Option<DurableRow<PullRequest>>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let row: Option<(Vec<u8>, String)> = conn
      .query_row(
        "SELECT pr_data, last_updated FROM bitbucket_pr_cache WHERE pr_id = ?1",
        params![pr_id as i64],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read pull request {}: {}", pr_id, e))?;

    row
      .map(|(data, last_updated)| decode_row(&data, &last_updated))
      .transpose()
  }
}

fn decode_row<T: serde::de::DeserializeOwned>(
  data: &[u8],
  last_updated: &str,
) -> Result<DurableRow<T>> {
  let entity =
    serde_json::from_slice(data).map_err(|e| eyre!("Failed to deserialize row: {}", e))?;
  let last_updated = DateTime::parse_from_rfc3339(last_updated)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", last_updated, e))?;
  Ok(DurableRow {
    entity,
    last_updated,
  })
}
