//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Effect categories are stored as
//! their lowercase names.

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use strains_core::strain::{Effect, EffectCategory, Flavor, Strain};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── EffectCategory ──────────────────────────────────────────────────────────

/// Column adapter for [`EffectCategory`], so effect rows decode inside
/// `rusqlite` row mappers.
pub struct Category(pub EffectCategory);

impl FromSql for Category {
  fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
    value
      .as_str()?
      .parse()
      .map(Category)
      .map_err(|e: strains_core::Error| FromSqlError::Other(Box::new(e)))
  }
}

/// Map a `(name, category)` row from the `effect` table.
pub fn effect_from_row(
  row: &rusqlite::Row<'_>,
  offset: usize,
) -> rusqlite::Result<Effect> {
  Ok(Effect {
    name:     row.get(offset)?,
    category: row.get::<_, Category>(offset + 1)?.0,
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `strain` row.
pub struct RawStrain {
  pub strain_id:    i64,
  pub reference_id: u64,
  pub name:         String,
  pub race:         String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawStrain {
  pub const COLUMNS: &'static str =
    "s.strain_id, s.reference_id, s.name, s.race, s.created_at, s.updated_at";

  /// Map a row selected with [`Self::COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      strain_id:    row.get(0)?,
      reference_id: row.get(1)?,
      name:         row.get(2)?,
      race:         row.get(3)?,
      created_at:   row.get(4)?,
      updated_at:   row.get(5)?,
    })
  }
}

/// A strain row together with its association rows, read inside one
/// connection call so the three parts are mutually consistent.
pub struct RawHydrated {
  pub strain:  RawStrain,
  pub flavors: Vec<Flavor>,
  pub effects: Vec<Effect>,
}

impl RawHydrated {
  pub fn into_strain(self) -> Result<Strain> {
    Ok(Strain {
      reference_id: self.strain.reference_id,
      name:         self.strain.name,
      race:         self.strain.race,
      flavors:      self.flavors,
      effects:      self.effects,
      created_at:   decode_dt(&self.strain.created_at)?,
      updated_at:   decode_dt(&self.strain.updated_at)?,
    })
  }
}
