mod api;
mod app;
mod commands;
mod config;
mod entity;
mod event;
mod listview;
mod logging;
mod request;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing::info;

use crate::api::SsisClient;
use crate::config::{Config, Credentials, ViewKind};

#[derive(Parser, Debug)]
#[command(name = "ssis")]
#[command(about = "A terminal admin client for the Simple Student Information System")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/ssis/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base URL, e.g. http://localhost:5000/api
  #[arg(short, long)]
  url: Option<String>,

  /// Screen to open first
  #[arg(long, value_enum)]
  view: Option<ViewKind>,

  /// Directory for log files (default: $XDG_DATA_HOME/ssis/logs)
  #[arg(long)]
  log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration. A URL on the command line is enough to run without a file.
  let mut config = Config::load(args.config.as_deref(), args.url.is_some())?;
  if let Some(url) = args.url {
    config.api.url = url;
  }
  if let Some(view) = args.view {
    config.default_view = view;
  }

  let log_dir = args
    .log_dir
    .or_else(logging::default_log_dir)
    .ok_or_else(|| eyre!("Could not determine a log directory, pass --log-dir"))?;
  let _guard = logging::init(&log_dir)?;
  info!(url = %config.api.url, view = config.default_view.label(), "starting ssis");

  let client = SsisClient::new(&config)?;
  match config.credentials()? {
    Credentials::Token(token) => client.set_token(Some(token)),
    Credentials::Password { username, password } => {
      let user = client
        .login(&username, &password)
        .await
        .map_err(|e| eyre!("Sign in as {} failed: {}", username, e))?;
      if let Some(user) = user {
        info!(user = %user.username, email = ?user.email, "session user");
      }
    }
  }
  info!(authenticated = client.has_token(), "session ready");

  // Initialize and run the app
  let mut app = app::App::new(config, client)?;
  app.run().await?;

  Ok(())
}
