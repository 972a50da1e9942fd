//! Shared HTTPS transport for the upstream REST APIs.
//!
//! Both upstreams speak JSON over HTTP Basic auth, so one thin wrapper around
//! `reqwest::Client` handles credentials, the per-request timeout, URL
//! assembly and the mapping of failures into [`ClientError`].

use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{ClientError, ClientResult};

#[derive(Clone)]
pub struct HttpClient {
  client: Client,
  base_url: Url,
  username: String,
  password: String,
  timeout: Duration,
}

impl HttpClient {
  pub fn new(
    base_url: &str,
    username: &str,
    password: &str,
    timeout: Duration,
  ) -> ClientResult<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    let base_url = Url::parse(base_url.trim_end_matches('/'))
      .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
    if base_url.cannot_be_a_base() {
      return Err(ClientError::InvalidUrl(base_url.to_string()));
    }

    Ok(Self {
      client,
      base_url,
      username: username.to_string(),
      password: password.to_string(),
      timeout,
    })
  }

  /// Base URL with the given path segments appended. Each segment is
  /// percent-encoded, so slugs and keys can't escape their position.
  pub fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  pub async fn get_json<T: DeserializeOwned>(
    &self,
    segments: &[&str],
    query: &[(&str, String)],
  ) -> ClientResult<T> {
    let url = self.endpoint(segments)?;
    tracing::debug!(url = %url, "GET");
    let request = self.client.get(url).query(query);
    self.send(request).await
  }

  pub async fn post_json<B: Serialize, T: DeserializeOwned>(
    &self,
    segments: &[&str],
    body: &B,
  ) -> ClientResult<T> {
    let url = self.endpoint(segments)?;
    tracing::debug!(url = %url, "POST");
    let request = self.client.post(url).json(body);
    self.send(request).await
  }

  async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
    let response = request
      .basic_auth(&self.username, Some(&self.password))
      .header("Accept", "application/json")
      .send()
      .await
      .map_err(|e| self.transport_error(e))?;

    let status = response.status();
    let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

    if status.is_success() {
      return Ok(serde_json::from_slice(&body)?);
    }

    let body = String::from_utf8_lossy(&body);
    Err(ClientError::Http {
      status: status.as_u16(),
      message: error_message(status.as_u16(), &body),
    })
  }
}

impl HttpClient {
  fn transport_error(&self, err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
      tracing::warn!(timeout = ?self.timeout, "upstream request timed out");
      ClientError::Timeout(self.timeout)
    } else {
      ClientError::Transport(err)
    }
  }
}

/// Extract a readable message from an upstream error body.
///
/// Understands Jira's `{"errorMessages": [...], "errors": {...}}` and
/// Bitbucket's `{"type": "error", "error": {"message": "..."}}` shapes and
/// falls back to the raw body or the status line.
fn error_message(status: u16, body: &str) -> String {
  if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
    let mut messages = Vec::new();

    if let Some(errors) = value.get("errorMessages").and_then(|e| e.as_array()) {
      messages.extend(errors.iter().filter_map(|e| e.as_str()).map(String::from));
    }

    if let Some(errors) = value.get("errors").and_then(|e| e.as_object()) {
      for (field, msg) in errors {
        if let Some(s) = msg.as_str() {
          messages.push(format!("{}: {}", field, s));
        }
      }
    }

    if let Some(msg) = value
      .get("error")
      .and_then(|e| e.get("message"))
      .and_then(|m| m.as_str())
    {
      messages.push(msg.to_string());
    }

    if !messages.is_empty() {
      return messages.join("; ");
    }
  }

  let body = body.trim();
  if body.is_empty() || body.len() > 512 {
    format!("Request failed with status code {}", status)
  } else {
    body.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_jira_error_body() {
    let body = r#"{"errorMessages":["Issue does not exist"],"errors":{"jql":"bad field"}}"#;
    assert_eq!(error_message(404, body), "Issue does not exist; jql: bad field");
  }

  #[test]
  fn test_bitbucket_error_body() {
    let body = r#"{"type":"error","error":{"message":"Repository not found"}}"#;
    assert_eq!(error_message(404, body), "Repository not found");
  }

  #[test]
  fn test_empty_body_uses_status() {
    assert_eq!(error_message(502, ""), "Request failed with status code 502");
  }

  #[tokio::test]
  async fn test_slow_upstream_times_out() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/slow"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(serde_json::json!({}))
          .set_delay(Duration::from_secs(3)),
      )
      .mount(&server)
      .await;

    let client = HttpClient::new(&server.uri(), "u", "p", Duration::from_millis(300)).unwrap();
    let started = std::time::Instant::now();
    let err = client
      .get_json::<serde_json::Value>(&["slow"], &[])
      .await
      .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(matches!(err, ClientError::Timeout(_)));
    assert_eq!(err.to_string(), "request timed out after 0.3s");
  }

  #[test]
  fn test_endpoint_encodes_segments() {
    let client = HttpClient::new(
      "https://api.bitbucket.org/2.0/",
      "u",
      "p",
      Duration::from_secs(10),
    )
    .unwrap();
    let url = client.endpoint(&["repositories", "ws", "my repo"]).unwrap();
    assert_eq!(
      url.as_str(),
      "https://api.bitbucket.org/2.0/repositories/ws/my%20repo"
    );
  }
}
