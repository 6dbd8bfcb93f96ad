//! SQLite backend for the strain catalog.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. A store is opened from a
//! [`DatabaseConfig`], then [`SqliteStore::ensure_schema`] must run once
//! before the [`StrainStore`](strains_core::store::StrainStore) methods are
//! used.

mod encode;
mod guard;
mod query;
mod reconcile;
mod retry;
mod schema;
mod store;

pub mod config;
pub mod error;

pub use config::DatabaseConfig;
pub use error::{Error, Result};
pub use guard::SchemaOutcome;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
