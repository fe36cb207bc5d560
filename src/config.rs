use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::listview::PageSize;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub default_view: ViewKind,
  #[serde(default)]
  pub page_size: PageSize,
  /// Custom title for header (defaults to "SSIS")
  pub title: Option<String>,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_api_url")]
  pub url: String,
  /// Used with SSIS_PASSWORD to sign in
  pub username: Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: default_api_url(),
      username: None,
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_api_url() -> String {
  DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  15
}

/// The entity screens
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
  #[default]
  Students,
  Programs,
  Colleges,
}

impl ViewKind {
  pub fn label(self) -> &'static str {
    match self {
      ViewKind::Students => "Students",
      ViewKind::Programs => "Programs",
      ViewKind::Colleges => "Colleges",
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  #[serde(default)]
  pub backend: CacheBackend,
}

/// Where the session response cache keeps its entries
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  #[default]
  Memory,
  /// In-memory SQLite database
  Sqlite,
  /// Disable caching
  None,
}

/// How to authenticate, from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
  Token(String),
  Password { username: String, password: String },
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./ssis.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/ssis/config.yaml
  ///
  /// With `allow_defaults`, a missing file yields the default configuration.
  pub fn load(explicit_path: Option<&Path>, allow_defaults: bool) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None if allow_defaults => Ok(Self::default()),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/ssis/config.yaml\n\
                 or pass --url to use the defaults."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("ssis.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("ssis").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is a null document
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Header title
  pub fn title(&self) -> &str {
    self.title.as_deref().unwrap_or("SSIS")
  }

  /// Resolve credentials from the environment.
  ///
  /// SSIS_API_TOKEN is used as-is. Otherwise SSIS_PASSWORD is paired with
  /// `api.username`.
  pub fn credentials(&self) -> Result<Credentials> {
    Self::credentials_from(
      self.api.username.as_deref(),
      std::env::var("SSIS_API_TOKEN").ok(),
      std::env::var("SSIS_PASSWORD").ok(),
    )
  }

  fn credentials_from(
    username: Option<&str>,
    token: Option<String>,
    password: Option<String>,
  ) -> Result<Credentials> {
    if let Some(token) = token.filter(|t| !t.is_empty()) {
      return Ok(Credentials::Token(token));
    }
    match (username, password) {
      (Some(username), Some(password)) => Ok(Credentials::Password {
        username: username.to_string(),
        password,
      }),
      (None, Some(_)) => Err(eyre!(
        "SSIS_PASSWORD is set but api.username is missing from the config file."
      )),
      _ => Err(eyre!(
        "No credentials found. Set SSIS_API_TOKEN, or SSIS_PASSWORD together with api.username."
      )),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_full_config() {
    let config = Config::parse(
      r#"
api:
  url: https://ssis.example.edu/api
  username: admin
  timeout_secs: 5
default_view: programs
page_size: 20
title: Registrar
cache:
  backend: sqlite
"#,
    )
    .unwrap();
    assert_eq!(config.api.url, "https://ssis.example.edu/api");
    assert_eq!(config.api.username.as_deref(), Some("admin"));
    assert_eq!(config.api.timeout_secs, 5);
    assert_eq!(config.default_view, ViewKind::Programs);
    assert_eq!(config.page_size, PageSize::Twenty);
    assert_eq!(config.title(), "Registrar");
    assert_eq!(config.cache.backend, CacheBackend::Sqlite);
  }

  #[test]
  fn test_defaults() {
    let config = Config::parse("api:\n  username: admin\n").unwrap();
    assert_eq!(config.api.url, DEFAULT_API_URL);
    assert_eq!(config.api.timeout_secs, 15);
    assert_eq!(config.default_view, ViewKind::Students);
    assert_eq!(config.page_size, PageSize::Ten);
    assert_eq!(config.cache.backend, CacheBackend::Memory);
    assert_eq!(config.title(), "SSIS");
    assert!(Config::parse("").is_ok());
  }

  #[test]
  fn test_invalid_page_size_rejected() {
    assert!(Config::parse("page_size: 7\n").is_err());
  }

  #[test]
  fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "default_view: colleges\ncache:\n  backend: none").unwrap();

    let config = Config::load(Some(file.path()), false).unwrap();
    assert_eq!(config.default_view, ViewKind::Colleges);
    assert_eq!(config.cache.backend, CacheBackend::None);
  }

  #[test]
  fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    assert!(Config::load(Some(&missing), true).is_err());
  }

  #[test]
  fn test_credentials_precedence() {
    assert_eq!(
      Config::credentials_from(Some("admin"), Some("t0k".into()), Some("pw".into())).unwrap(),
      Credentials::Token("t0k".into())
    );
    assert_eq!(
      Config::credentials_from(Some("admin"), Some(String::new()), Some("pw".into())).unwrap(),
      Credentials::Password {
        username: "admin".into(),
        password: "pw".into()
      }
    );
    assert!(Config::credentials_from(None, None, Some("pw".into())).is_err());
    assert!(Config::credentials_from(Some("admin"), None, None).is_err());
  }
}
