use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "ssis=info";

/// Default log directory: $XDG_DATA_HOME/ssis/logs
pub fn default_log_dir() -> Option<PathBuf> {
  dirs::data_dir().map(|d| d.join("ssis").join("logs"))
}

/// Filter from SSIS_LOG, then RUST_LOG, then `ssis=info`
fn env_filter() -> EnvFilter {
  EnvFilter::try_from_env("SSIS_LOG")
    .or_else(|_| EnvFilter::try_from_default_env())
    .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Send tracing output to a daily rolling file in `dir`.
///
/// The terminal belongs to the TUI, so nothing is written to stderr. Keep the
/// returned guard alive until exit or buffered lines are lost.
pub fn init(dir: &Path) -> Result<WorkerGuard> {
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(dir, "ssis.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(env_filter())
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false),
    )
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
