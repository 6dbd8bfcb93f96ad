//! Error type for `strains-store-sqlite`.

use strains_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Core(#[from] strains_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("unable to create database directory: {0}")]
  Io(#[from] std::io::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A reconciliation step failed and the transaction was rolled back.
  #[error("reconciling strain {reference_id} failed: {source}")]
  Reconcile {
    reference_id: u64,
    #[source]
    source:       Box<Error>,
  },

  /// Every attempt of a bounded retry failed; `source` is the last failure.
  #[error("giving up after {attempts} attempts: {source}")]
  RetriesExhausted {
    attempts: u32,
    #[source]
    source:   Box<Error>,
  },
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::ConnectionClosed => {
        Self::Core(strains_core::Error::DatabaseConnectionNil)
      }
      other => Self::Database(other),
    }
  }
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self {
    Self::Database(tokio_rusqlite::Error::Rusqlite(e))
  }
}

impl StoreError for Error {
  fn domain(&self) -> Option<&strains_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      Self::Reconcile { source, .. } | Self::RetriesExhausted { source, .. } => {
        source.domain()
      }
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
