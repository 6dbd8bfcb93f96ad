//! Strain catalog HTTP server.
//!
//! Reads `strains.toml` (or the path given with `--config`), opens the SQLite
//! catalog, checks the schema version and serves the JSON API under `/api`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use strains_server::{init_tracing, load_config};
use strains_store_sqlite::SqliteStore;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about = "Strain catalog HTTP server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "strains.toml")]
  config: PathBuf,

  /// Listen on this port instead of the configured one.
  #[arg(short, long)]
  port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let mut config = load_config(&cli.config)?;
  if let Some(port) = cli.port {
    config.server.port = port;
  }
  init_tracing(&config.log)?;

  let store = SqliteStore::open(&config.database)
    .await
    .with_context(|| {
      format!("failed to open database at {}", config.database.path().display())
    })?;
  store
    .ensure_schema(config.schema_version)
    .await
    .context("schema version check failed")?;

  let app = Router::new().nest(
    "/api",
    strains_api::api_router(Arc::new(store), config.create_retries),
  );
  let address = config.server.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
