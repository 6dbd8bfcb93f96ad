//! Connection settings for the SQLite store.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::Result;

pub const DEFAULT_DATABASE_NAME: &str = "so_many_strains";

/// Where the logical database lives and who is operating on it.
///
/// Passed explicitly to [`SqliteStore::open`](crate::SqliteStore::open); no
/// part of the store reads process-wide settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
  /// Directory holding the database file. Created if absent.
  pub data_dir:        PathBuf,
  /// Logical database name; the file is `<data_dir>/<name>.sqlite3`.
  pub name:            String,
  /// Operator identity, recorded against each schema version bump.
  pub username:        String,
  /// How long a statement waits on a locked database before failing.
  pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
  fn default() -> Self {
    Self {
      data_dir:        PathBuf::from("."),
      name:            DEFAULT_DATABASE_NAME.to_owned(),
      username:        "root".to_owned(),
      busy_timeout_ms: 5_000,
    }
  }
}

impl DatabaseConfig {
  /// Reject settings that would otherwise fail later with a more obscure
  /// error.
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(strains_core::Error::DatabaseNameNotSet.into());
    }
    if self.username.trim().is_empty() {
      return Err(strains_core::Error::DatabaseUsernameNotSet.into());
    }
    Ok(())
  }

  pub fn path(&self) -> PathBuf {
    self.data_dir.join(format!("{}.sqlite3", self.name))
  }

  pub fn busy_timeout(&self) -> Duration {
    Duration::from_millis(self.busy_timeout_ms)
  }
}
