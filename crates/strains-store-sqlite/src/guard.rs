//! Schema version guard.
//!
//! Applies the structural schema and records the schema generation in the
//! single `database_ver` row. The stored generation never moves backwards: a
//! binary built against an older schema refuses to run rather than silently
//! downgrading the marker.

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use crate::{Result, SqliteStore, encode::encode_dt, schema::SCHEMA};

/// What [`SqliteStore::ensure_schema`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
  /// The stored version already matched; nothing was written.
  Current(u32),
  /// The stored version was behind and has been replaced.
  Advanced { from: u32, to: u32 },
}

impl SchemaOutcome {
  pub fn version(self) -> u32 {
    match self {
      Self::Current(v) => v,
      Self::Advanced { to, .. } => to,
    }
  }
}

/// Read the stored iteration; a missing table or row counts as version 0.
fn stored_iteration(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
  let has_table = conn
    .query_row(
      "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'database_ver'",
      [],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if !has_table {
    return Ok(0);
  }

  Ok(
    conn
      .query_row("SELECT iteration FROM database_ver WHERE id = 1", [], |r| r.get(0))
      .optional()?
      .unwrap_or(0),
  )
}

impl SqliteStore {
  /// Bring the schema to `desired` (0 is treated as 1).
  ///
  /// | stored vs desired | result |
  /// |---|---|
  /// | stored > desired | `VersionRegression`, nothing written |
  /// | stored == desired | [`SchemaOutcome::Current`] |
  /// | stored < desired | version row replaced, [`SchemaOutcome::Advanced`] |
  ///
  /// Not safe to run concurrently with itself; call once at startup before
  /// any other traffic.
  pub async fn ensure_schema(&self, desired: u32) -> Result<SchemaOutcome> {
    let desired = desired.max(1);
    let operator = self.operator.clone();
    let now = encode_dt(Utc::now());

    let stored = self
      .conn
      .call(move |conn| {
        conn.execute_batch(SCHEMA)?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let stored = stored_iteration(&tx)?;
        if stored < desired {
          tx.execute(
            "INSERT INTO database_ver (id, iteration, applied_by, applied_at)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT (id) DO UPDATE SET
               iteration  = excluded.iteration,
               applied_by = excluded.applied_by,
               applied_at = excluded.applied_at",
            rusqlite::params![desired, operator, now],
          )?;
          tx.commit()?;
        }
        Ok(stored)
      })
      .await?;

    if stored > desired {
      tracing::error!(stored, desired, "refusing to downgrade schema version");
      return Err(
        strains_core::Error::VersionRegression { stored, desired }.into(),
      );
    }

    let outcome = if stored == desired {
      SchemaOutcome::Current(stored)
    } else {
      SchemaOutcome::Advanced { from: stored, to: desired }
    };
    tracing::info!(stored, desired, ?outcome, "schema version ensured");
    Ok(outcome)
  }

  /// The schema version currently recorded, or 0 before the first guard run.
  pub async fn schema_version(&self) -> Result<u32> {
    Ok(self.conn.call(|conn| Ok(stored_iteration(conn)?)).await?)
  }
}
