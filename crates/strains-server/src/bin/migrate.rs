//! Schema migration and seeding.
//!
//! Brings the catalog's schema to the target version, then optionally
//! reconciles every record of a JSON seed file. Individual records that fail
//! are logged and skipped; only configuration and schema-version failures end
//! the process with an error.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use strains_server::{init_tracing, load_config, load_seed, seed};
use strains_store_sqlite::{SchemaOutcome, SqliteStore};

#[derive(Parser)]
#[command(author, version, about = "Strain catalog schema migration and seeding")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "strains.toml")]
  config: PathBuf,

  /// JSON file holding an array of strains to reconcile.
  #[arg(short, long)]
  seed: Option<PathBuf>,

  /// Schema version to ensure; defaults to `schema_version` from the config.
  #[arg(short, long)]
  target_version: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let config = load_config(&cli.config)?;
  init_tracing(&config.log)?;

  let store = SqliteStore::open(&config.database)
    .await
    .with_context(|| {
      format!("failed to open database at {}", config.database.path().display())
    })?;

  let target = cli.target_version.unwrap_or(config.schema_version);
  match store
    .ensure_schema(target)
    .await
    .context("schema version check failed")?
  {
    SchemaOutcome::Current(v) => tracing::info!("schema already at version {v}"),
    SchemaOutcome::Advanced { from, to } => {
      tracing::info!("schema advanced from version {from} to {to}")
    }
  }

  if let Some(path) = cli.seed {
    let records = load_seed(&path)?;
    tracing::info!(records = records.len(), path = %path.display(), "seeding");
    let report = seed(&store, records).await;
    println!("applied {} records, {} failed", report.applied, report.failed);
  }

  store.close().await.context("failed to close database")?;
  Ok(())
}
