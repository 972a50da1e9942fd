pub mod api_types;
pub mod cache;
pub mod client;
pub mod jql;
pub mod normalize;
pub mod service;
pub mod types;

pub use client::{IssueTracker, JiraClient};
pub use jql::{JqlBuilder, SortOrder};
pub use normalize::is_valid_issue_key;
pub use service::JiraService;
pub use types::{Issue, Project, SearchOptions, SearchResult};
