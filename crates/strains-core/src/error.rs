//! Error types for `strains-core`.

use thiserror::Error;

/// Which read projection missed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
  ReferenceId(u64),
  Name(String),
}

impl std::fmt::Display for Lookup {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::ReferenceId(id) => write!(f, "reference id {id}"),
      Self::Name(name) => write!(f, "name {name:?}"),
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  // ── Configuration ───────────────────────────────────────────────────────
  #[error("database name was not set")]
  DatabaseNameNotSet,

  #[error("database username was not set")]
  DatabaseUsernameNotSet,

  // ── Guard ───────────────────────────────────────────────────────────────
  #[error(
    "stored schema version {stored} is newer than the desired version \
     {desired}"
  )]
  VersionRegression { stored: u32, desired: u32 },

  // ── Preconditions ───────────────────────────────────────────────────────
  #[error("the database connection is not open")]
  DatabaseConnectionNil,

  #[error("the reference id must be set for this operation")]
  ReferenceIdNotSet,

  #[error("reference id {0} is larger than the store can hold")]
  ReferenceIdOutOfRange(u64),

  // ── Outcomes ────────────────────────────────────────────────────────────
  #[error("strain with reference id {0} already exists")]
  RecordAlreadyExists(u64),

  #[error("strain not found: {0}")]
  NotFound(Lookup),

  #[error("unknown effect category: {0:?}")]
  UnknownEffectCategory(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Implemented by backend error types so that outer layers (HTTP, CLI) can
/// classify a failure by its domain kind without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The domain error underlying this failure, if there is one.
  fn domain(&self) -> Option<&Error>;
}

impl StoreError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
