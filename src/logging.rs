//! Tracing subscriber setup for binaries embedding the bridge.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Install a global subscriber that writes to stderr through a non-blocking
/// writer.
///
/// The filter comes from `RUST_LOG`, falling back to `default_level`.
/// Keep the returned guard alive for the lifetime of the process or buffered
/// lines are lost on exit.
pub fn init(default_level: &str) -> WorkerGuard {
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

  // A subscriber may already be installed by the host application.
  let _ = fmt()
    .with_env_filter(filter)
    .with_target(true)
    .with_writer(writer)
    .try_init();

  guard
}
