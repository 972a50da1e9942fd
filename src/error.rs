//! Typed errors surfaced by the upstream clients.

use std::error::Error as _;
use std::time::Duration;
use thiserror::Error;

/// Failure of a call against Jira or Bitbucket.
#[derive(Error, Debug)]
pub enum ClientError {
  /// Credentials for the upstream are missing, so the client is disabled.
  #[error("{0} not configured")]
  NotConfigured(&'static str),

  /// The upstream answered with a non-success status.
  #[error("{message}")]
  Http { status: u16, message: String },

  /// The upstream did not answer within the per-request timeout.
  #[error("request timed out after {}s", .0.as_secs_f64())]
  Timeout(Duration),

  /// Connection or TLS failure before a response arrived.
  #[error("{}", describe_transport(.0))]
  Transport(#[from] reqwest::Error),

  #[error("Failed to parse upstream response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("Invalid upstream URL: {0}")]
  InvalidUrl(String),
}

impl ClientError {
  pub fn is_not_configured(&self) -> bool {
    matches!(self, ClientError::NotConfigured(_))
  }

  /// True when the upstream reported the entity does not exist.
  pub fn is_not_found(&self) -> bool {
    matches!(self, ClientError::Http { status: 404, .. })
  }
}

/// reqwest's own message names the URL but hides the cause, so append the
/// source chain.
fn describe_transport(err: &reqwest::Error) -> String {
  let mut message = err.to_string();
  let mut source = err.source();
  while let Some(cause) = source {
    message.push_str(": ");
    message.push_str(&cause.to_string());
    source = cause.source();
  }
  message
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_not_configured_message() {
    let err = ClientError::NotConfigured("bitbucket");
    assert_eq!(err.to_string(), "bitbucket not configured");
    assert!(err.is_not_configured());
  }

  #[test]
  fn test_timeout_message_names_the_limit() {
    let err = ClientError::Timeout(Duration::from_secs(10));
    assert_eq!(err.to_string(), "request timed out after 10s");
    assert_eq!(
      ClientError::Timeout(Duration::from_millis(300)).to_string(),
      "request timed out after 0.3s"
    );
  }

  #[test]
  fn test_http_error_shows_upstream_message() {
    let err = ClientError::Http {
      status: 404,
      message: "Issue does not exist or you do not have permission to see it.".to_string(),
    };
    assert!(err.is_not_found());
    assert_eq!(
      err.to_string(),
      "Issue does not exist or you do not have permission to see it."
    );
  }
}
