use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default per-request timeout for upstream calls, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Bitbucket Cloud REST v2 base.
pub const BITBUCKET_API_BASE: &str = "https://api.bitbucket.org/2.0";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub jira: JiraConfig,
  #[serde(default)]
  pub bitbucket: BitbucketConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Per-request upstream timeout (defaults to 10s)
  pub http_timeout_secs: Option<u64>,
}

/// Jira settings. Every field is optional so that a partially configured
/// environment still loads; the client is disabled unless host, email and
/// token are all present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JiraConfig {
  /// Host name, e.g. "acme.atlassian.net"
  pub host: Option<String>,
  pub email: Option<String>,
  pub api_token: Option<String>,
  /// Project used when callers don't name one
  pub project_key: Option<String>,
  /// Full base URL override (scheme included). Takes precedence over `host`.
  pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BitbucketConfig {
  pub workspace: Option<String>,
  pub username: Option<String>,
  pub app_password: Option<String>,
  /// Repository used when callers don't name one
  pub default_repo: Option<String>,
  /// API base override (defaults to Bitbucket Cloud)
  pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Redis URL for the fast cache. Without it an in-process cache is used.
  pub redis_url: Option<String>,
  /// SQLite path for the durable cache
  pub db_path: Option<PathBuf>,
  /// When set, serve durable-cache rows no older than this many seconds
  /// if the upstream call fails.
  pub fallback_stale_secs: Option<u64>,
}

impl JiraConfig {
  /// True when host (or base URL), email and token are all present.
  pub fn is_configured(&self) -> bool {
    (self.host.is_some() || self.base_url.is_some())
      && self.email.is_some()
      && self.api_token.is_some()
  }

  /// Base URL for REST calls, e.g. "https://acme.atlassian.net".
  pub fn base_url(&self) -> Option<String> {
    if let Some(base) = &self.base_url {
      return Some(base.trim_end_matches('/').to_string());
    }
    self.host.as_ref().map(|host| {
      let host = host.trim_end_matches('/');
      if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
      } else {
        format!("https://{}", host)
      }
    })
  }
}

impl BitbucketConfig {
  pub fn is_configured(&self) -> bool {
    self.workspace.is_some() && self.username.is_some() && self.app_password.is_some()
  }

  pub fn api_base(&self) -> String {
    self
      .api_base
      .as_deref()
      .unwrap_or(BITBUCKET_API_BASE)
      .trim_end_matches('/')
      .to_string()
  }
}

impl Config {
  /// Load configuration from the process environment only.
  pub fn from_env() -> Self {
    let mut config = Self::default();
    config.apply_overrides(|key| std::env::var(key).ok());
    config
  }

  /// Load configuration from a YAML file, then apply environment overrides.
  ///
  /// Search order when no explicit path is given:
  /// 1. ./chatops-bridge.yaml (current directory)
  /// 2. $XDG_CONFIG_HOME/chatops-bridge/config.yaml
  ///
  /// A missing file is not an error; the environment alone is used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = match explicit_path {
      Some(p) if p.exists() => Some(p.to_path_buf()),
      Some(p) => return Err(eyre!("Config file not found: {}", p.display())),
      None => Self::find_config_file(),
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("chatops-bridge.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("chatops-bridge").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let mut config: Config = serde_yaml::from_str(contents)?;
    config.drop_empty_values();
    Ok(config)
  }

  /// Overlay values from a key lookup (normally the process environment).
  /// Empty values count as missing.
  pub fn apply_overrides<F>(&mut self, lookup: F)
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let jira = &mut self.jira;
    override_with(&mut jira.host, get("JIRA_HOST"));
    override_with(&mut jira.email, get("JIRA_EMAIL"));
    override_with(&mut jira.api_token, get("JIRA_API_TOKEN"));
    override_with(&mut jira.project_key, get("JIRA_PROJECT_KEY"));
    override_with(&mut jira.base_url, get("JIRA_BASE_URL"));

    let bitbucket = &mut self.bitbucket;
    override_with(&mut bitbucket.workspace, get("BITBUCKET_WORKSPACE"));
    override_with(&mut bitbucket.username, get("BITBUCKET_USERNAME"));
    override_with(&mut bitbucket.app_password, get("BITBUCKET_APP_PASSWORD"));
    override_with(&mut bitbucket.default_repo, get("BITBUCKET_DEFAULT_REPO"));
    override_with(&mut bitbucket.api_base, get("BITBUCKET_API_BASE"));

    override_with(&mut self.cache.redis_url, get("BRIDGE_REDIS_URL"));
    override_with(&mut self.cache.db_path, get("BRIDGE_CACHE_DB").map(PathBuf::from));
    override_with(
      &mut self.cache.fallback_stale_secs,
      get("BRIDGE_DC_FALLBACK_SECS").and_then(|v| v.parse().ok()),
    );
    override_with(
      &mut self.http_timeout_secs,
      get("BRIDGE_HTTP_TIMEOUT_SECS").and_then(|v| v.parse().ok()),
    );
  }

  /// Durable-cache fallback window. `None` when unset or too large to
  /// represent, in which case the fallback stays off.
  pub fn fallback_stale_max(&self) -> Option<chrono::Duration> {
    let secs = self.cache.fallback_stale_secs?;
    let window = i64::try_from(secs)
      .ok()
      .and_then(chrono::Duration::try_seconds);
    if window.is_none() {
      tracing::warn!(secs, "durable fallback window out of range, fallback disabled");
    }
    window
  }

  pub fn http_timeout(&self) -> std::time::Duration {
    std::time::Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
  }

  fn drop_empty_values(&mut self) {
    for field in [
      &mut self.jira.host,
      &mut self.jira.email,
      &mut self.jira.api_token,
      &mut self.jira.project_key,
      &mut self.jira.base_url,
      &mut self.bitbucket.workspace,
      &mut self.bitbucket.username,
      &mut self.bitbucket.app_password,
      &mut self.bitbucket.default_repo,
      &mut self.bitbucket.api_base,
      &mut self.cache.redis_url,
    ] {
      if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
        *field = None;
      }
    }
  }
}

fn override_with<T>(slot: &mut Option<T>, value: Option<T>) {
  if value.is_some() {
    *slot = value;
  }
}
