//! Uniform envelope returned by every facade operation.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Either the data of a successful read or a human-readable error.
///
/// Serializes as `{"data": ...}` or `{"error": "..."}`, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response<T> {
  Data(T),
  Error(String),
}

impl<T> Response<T> {
  /// Build an error envelope from a client failure, falling back to
  /// `fallback` when the failure carries no message.
  pub fn from_error(err: &ClientError, fallback: &str) -> Self {
    let message = err.to_string();
    if message.trim().is_empty() {
      Response::Error(fallback.to_string())
    } else {
      Response::Error(message)
    }
  }

  pub fn is_data(&self) -> bool {
    matches!(self, Response::Data(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, Response::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      Response::Data(data) => Some(data),
      Response::Error(_) => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      Response::Error(e) => Some(e),
      Response::Data(_) => None,
    }
  }

  pub fn into_data(self) -> Option<T> {
    match self {
      Response::Data(data) => Some(data),
      Response::Error(_) => None,
    }
  }
}

/// Convert a client result into an envelope, logging failures under the
/// operation name.
pub(crate) fn respond<T>(operation: &'static str, result: ClientResult<T>) -> Response<T> {
  match result {
    Ok(data) => Response::Data(data),
    Err(err) => {
      tracing::error!(error = %err, operation, "{} failed", operation);
      Response::from_error(&err, &format!("{} failed", operation))
    }
  }
}

/// Outcome of an upstream liveness probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
  pub success: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub server_title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub workspace: Option<String>,
}

impl ConnectionInfo {
  pub fn connected(message: impl Into<String>) -> Self {
    Self {
      success: true,
      message: message.into(),
      server_title: None,
      version: None,
      workspace: None,
    }
  }

  pub fn failed(message: impl Into<String>) -> Self {
    Self {
      success: false,
      ..Self::connected(message)
    }
  }
}
