//! Application configuration.
//!
//! Read from an optional TOML file and overlaid by environment variables of
//! the form `STRAINS__SECTION__KEY`, e.g. `STRAINS__DATABASE__NAME=catalog` or
//! `STRAINS__SERVER__PORT=9000`. Every field has a default, so an absent file
//! yields a runnable configuration.

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use strains_store_sqlite::DatabaseConfig;

pub const ENV_PREFIX: &str = "STRAINS";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub database:       DatabaseConfig,
  pub server:         ServerConfig,
  pub log:            LogConfig,
  /// Schema generation this build expects; see `SqliteStore::ensure_schema`.
  pub schema_version: u32,
  /// Additional attempts for a strict create after a transient failure.
  pub create_retries: u32,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database:       DatabaseConfig::default(),
      server:         ServerConfig::default(),
      log:            LogConfig::default(),
      schema_version: 1,
      create_retries: 3,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host: String,
  pub port: u16,
}

impl Default for ServerConfig {
  fn default() -> Self { Self { host: "127.0.0.1".to_owned(), port: 8888 } }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
  #[default]
  Text,
  Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Default level directive; `RUST_LOG` takes precedence when set.
  pub level:  String,
  pub format: LogFormat,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self { level: "info".to_owned(), format: LogFormat::Text }
  }
}

/// Load configuration from `path` (which need not exist) and the environment.
pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
  let settings = ::config::Config::builder()
    .add_source(::config::File::from(path).required(false))
    .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
    .build()
    .with_context(|| format!("failed to read config file {}", path.display()))?;

  settings
    .try_deserialize()
    .context("failed to deserialise AppConfig")
}
