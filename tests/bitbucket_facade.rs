mod common;

use std::sync::Arc;
use std::time::Duration;

use chatops_bridge::bitbucket::{BitbucketClient, BitbucketService, CreatePullRequest, PrState};
use chatops_bridge::cache::{CacheLayer, DurableCache, MemoryCache};
use chatops_bridge::config::BitbucketConfig;
use common::{broken_durable, pull_request, BrokenCache, FakeHost};

fn service(host: Arc<FakeHost>) -> BitbucketService<FakeHost, MemoryCache> {
  BitbucketService::new(host, CacheLayer::new(Arc::new(MemoryCache::new())))
    .with_default_repo(Some("api".to_string()))
}

#[tokio::test]
async fn unconfigured_client_lists_nothing_but_says_why() {
  let client = BitbucketClient::new(&BitbucketConfig::default(), Duration::from_secs(10));
  let svc = BitbucketService::new(
    Arc::new(client),
    CacheLayer::new(Arc::new(MemoryCache::new())),
  );

  let response = svc.list_pull_requests(Some("repo"), PrState::Open).await;
  let message = response.error().unwrap();
  assert!(message.contains("not configured"), "{}", message);
  assert!(svc.workspace().is_none());
}

#[tokio::test(start_paused = true)]
async fn pull_request_ttl_window() {
  let host = Arc::new(FakeHost::default());
  let svc = service(Arc::clone(&host));

  svc.get_pr(Some("repo"), 1).await;
  assert_eq!(host.pr_calls(), 1);

  tokio::time::advance(Duration::from_secs(150)).await;
  let response = svc.get_pr(Some("repo"), 1).await;
  assert_eq!(response.data(), Some(&pull_request("repo", 1)));
  assert_eq!(host.pr_calls(), 1);

  tokio::time::advance(Duration::from_secs(50)).await;
  svc.get_pr(Some("repo"), 1).await;
  assert_eq!(host.pr_calls(), 2);
}

#[tokio::test]
async fn pull_requests_are_keyed_per_repo() {
  let host = Arc::new(FakeHost::default());
  let svc = service(Arc::clone(&host));

  svc.get_pr(None, 1).await;
  svc.get_pr(Some("api"), 1).await;
  svc.get_pr(Some("web"), 1).await;

  assert_eq!(host.pr_calls(), 2);
}

#[tokio::test]
async fn invalidate_pr_forces_refresh() {
  let host = Arc::new(FakeHost::default());
  let svc = service(Arc::clone(&host));

  svc.get_pr(Some("api"), 3).await;
  svc.invalidate_pr("api", 3).await;
  svc.get_pr(Some("api"), 3).await;

  assert_eq!(host.pr_calls(), 2);
}

#[tokio::test]
async fn broken_fast_cache_never_surfaces() {
  let host = Arc::new(FakeHost::default());
  let svc = BitbucketService::new(Arc::clone(&host), CacheLayer::new(Arc::new(BrokenCache)));

  assert!(svc.get_pr(Some("api"), 1).await.is_data());
  assert!(svc.get_branches(Some("api")).await.is_data());

  host.fail();
  assert_eq!(
    svc.get_pr(Some("api"), 1).await.error(),
    Some("Service Unavailable")
  );
}

#[tokio::test]
async fn fallback_checks_repository() {
  let host = Arc::new(FakeHost::default());
  let durable = Arc::new(DurableCache::open_in_memory().unwrap());
  let layer = CacheLayer::new(Arc::new(MemoryCache::new()))
    .with_durable_fallback(Some(chrono::Duration::minutes(30)));
  let svc =
    BitbucketService::new(Arc::clone(&host), layer).with_durable(Some(Arc::clone(&durable)));

  // Snapshot of PR 4 as mirrored from "api"
  durable.upsert_pull_request(&pull_request("api", 4)).unwrap();
  host.fail();

  let response = svc.get_pr(Some("api"), 4).await;
  assert_eq!(response.data().map(|pr| pr.id), Some(4));

  let response = svc.get_pr(Some("web"), 4).await;
  assert_eq!(response.error(), Some("Service Unavailable"));
}

#[tokio::test]
async fn empty_list_is_data() {
  let svc = service(Arc::new(FakeHost::default()));
  let response = svc.list_repositories().await;
  let json = serde_json::to_value(&response).unwrap();
  assert_eq!(json, serde_json::json!({ "data": [] }));
}

#[tokio::test]
async fn durable_write_failures_are_skipped() {
  let dir = tempfile::tempdir().unwrap();
  let durable = Arc::new(broken_durable(dir.path()));
  assert!(durable.upsert_pull_request(&pull_request("api", 1)).is_err());

  let host = Arc::new(FakeHost::default());
  let svc = service(Arc::clone(&host)).with_durable(Some(durable));

  let listed = svc.list_pull_requests(None, PrState::Open).await;
  assert_eq!(listed.data().map(|prs| prs.len()), Some(1));

  let fetched = svc.get_pr(None, 4).await;
  assert_eq!(fetched.data().map(|pr| pr.id), Some(4));

  let payload = CreatePullRequest {
    repo_slug: "api".to_string(),
    title: "Cache".to_string(),
    description: None,
    source_branch: "feature".to_string(),
    destination_branch: "main".to_string(),
    close_source_branch: false,
  };
  let created = svc.create_pull_request(&payload).await;
  assert_eq!(created.data().map(|pr| pr.id), Some(99));
}
