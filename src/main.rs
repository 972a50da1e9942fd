use chatops_bridge::bitbucket::{CreatePullRequest, PrState};
use chatops_bridge::{logging, Bridge, Config, Response};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bridge-probe")]
#[command(about = "Run one chat-ops bridge read and print the response envelope")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/chatops-bridge/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Log level when RUST_LOG is unset
  #[arg(long, default_value = "warn")]
  log_level: String,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Probe both upstreams
  Ping,
  /// Fetch one Jira issue
  Issue { key: String },
  /// Run a raw JQL search
  Search {
    jql: String,
    #[arg(long, default_value_t = 50)]
    max_results: u32,
    #[arg(long, default_value_t = 0)]
    start_at: u32,
  },
  /// Search summary and description text
  Text {
    text: String,
    #[arg(short, long)]
    project: Option<String>,
  },
  /// Open issues assigned to the configured email
  Mine {
    #[arg(short, long)]
    project: Option<String>,
  },
  /// Issues in the project's open sprints
  Sprint {
    #[arg(short, long)]
    project: Option<String>,
  },
  /// Issues outside any sprint
  Backlog {
    #[arg(short, long)]
    project: Option<String>,
  },
  /// Show a Jira project
  Project { key: Option<String> },
  /// List repositories in the workspace
  Repos,
  /// List pull requests
  Prs {
    #[arg(short, long)]
    repo: Option<String>,
    #[arg(short, long, default_value = "OPEN")]
    state: String,
  },
  /// Show one pull request
  Pr {
    id: u64,
    #[arg(short, long)]
    repo: Option<String>,
  },
  /// Open a pull request
  CreatePr {
    #[arg(short, long)]
    repo: Option<String>,
    #[arg(long)]
    title: String,
    #[arg(long)]
    source: String,
    #[arg(long, default_value = "main")]
    destination: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    close_source_branch: bool,
  },
  /// List branches
  Branches {
    #[arg(short, long)]
    repo: Option<String>,
  },
  /// Recent commits
  Commits {
    #[arg(short, long)]
    repo: Option<String>,
    #[arg(short, long)]
    branch: Option<String>,
    #[arg(short, long)]
    limit: Option<u32>,
  },
}

fn print<T: Serialize>(response: &Response<T>) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(response)?);
  Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = logging::init(&args.log_level);

  let config = Config::load(args.config.as_deref())?;
  let bridge = Bridge::from_config(&config);

  match args.command {
    Command::Ping => {
      print(&bridge.jira.test_connection().await)?;
      print(&bridge.bitbucket.test_connection().await)?;
    }
    Command::Issue { key } => print(&bridge.jira.get_issue(&key).await)?,
    Command::Search {
      jql,
      max_results,
      start_at,
    } => print(&bridge.jira.search_issues(&jql, max_results, start_at).await)?,
    Command::Text { text, project } => {
      print(&bridge.jira.search_by_text(&text, project.as_deref()).await)?
    }
    Command::Mine { project } => {
      print(&bridge.jira.get_assigned_to_me(project.as_deref()).await)?
    }
    Command::Sprint { project } => {
      print(&bridge.jira.get_active_sprint(project.as_deref()).await)?
    }
    Command::Backlog { project } => print(&bridge.jira.get_backlog(project.as_deref()).await)?,
    Command::Project { key } => print(&bridge.jira.get_project(key.as_deref()).await)?,
    Command::Repos => print(&bridge.bitbucket.list_repositories().await)?,
    Command::Prs { repo, state } => {
      let state = PrState::parse(&state).ok_or_else(|| eyre!("Unknown state: {}", state))?;
      print(&bridge.bitbucket.list_pull_requests(repo.as_deref(), state).await)?
    }
    Command::Pr { id, repo } => print(&bridge.bitbucket.get_pr(repo.as_deref(), id).await)?,
    Command::CreatePr {
      repo,
      title,
      source,
      destination,
      description,
      close_source_branch,
    } => {
      let repo_slug = repo
        .or_else(|| bridge.bitbucket.default_repo().map(String::from))
        .ok_or_else(|| eyre!("No repository given and no default configured"))?;
      let payload = CreatePullRequest {
        repo_slug,
        title,
        description,
        source_branch: source,
        destination_branch: destination,
        close_source_branch,
      };
      print(&bridge.bitbucket.create_pull_request(&payload).await)?
    }
    Command::Branches { repo } => print(&bridge.bitbucket.get_branches(repo.as_deref()).await)?,
    Command::Commits {
      repo,
      branch,
      limit,
    } => print(
      &bridge
        .bitbucket
        .get_commits(repo.as_deref(), branch.as_deref(), limit)
        .await,
    )?,
  }

  Ok(())
}
