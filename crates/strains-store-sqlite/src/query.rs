//! Read-side projections.
//!
//! A strain is assembled in two steps: select the matching base rows, then
//! load each one's flavors and effects through the junction tables. The
//! associations are many-to-many and cannot be flattened into one row.

use rusqlite::{Connection, params};
use strains_core::strain::{EffectCategory, Flavor};

use crate::encode::{RawHydrated, RawStrain, effect_from_row};

/// One read projection, owned so it can move onto the connection thread.
#[derive(Debug, Clone)]
pub(crate) enum StrainQuery {
  ReferenceId(u64),
  Name(String),
  Race(String),
  Flavor(String),
  Effect(String, Option<EffectCategory>),
  All,
}

impl StrainQuery {
  fn sql(&self) -> String {
    let cols = RawStrain::COLUMNS;
    let tail = match self {
      Self::ReferenceId(_) => "FROM strain s WHERE s.reference_id = ?1",
      Self::Name(_) => "FROM strain s WHERE s.name = ?1",
      Self::Race(_) => "FROM strain s WHERE s.race = ?1",
      Self::Flavor(_) => {
        "FROM strain s
         JOIN strain_flavors sf ON sf.strain_id = s.strain_id
         JOIN flavor f          ON f.flavor_id  = sf.flavor_id
         WHERE f.name = ?1"
      }
      Self::Effect(..) => {
        "FROM strain s
         JOIN strain_effects se ON se.strain_id = s.strain_id
         JOIN effect e          ON e.effect_id  = se.effect_id
         WHERE e.name = ?1 AND (?2 IS NULL OR e.category = ?2)"
      }
      Self::All => "FROM strain s",
    };
    format!("SELECT DISTINCT {cols} {tail} ORDER BY s.reference_id")
  }

  /// Run the projection and hydrate every matching strain.
  pub fn load(&self, conn: &Connection) -> rusqlite::Result<Vec<RawHydrated>> {
    let sql = self.sql();
    let mut stmt = conn.prepare(&sql)?;
    let strains = match self {
      Self::ReferenceId(id) => stmt.query_map(params![id], RawStrain::from_row)?,
      Self::Name(v) | Self::Race(v) | Self::Flavor(v) => {
        stmt.query_map(params![v], RawStrain::from_row)?
      }
      Self::Effect(name, category) => stmt.query_map(
        params![name, (*category).map(EffectCategory::as_str)],
        RawStrain::from_row,
      )?,
      Self::All => stmt.query_map([], RawStrain::from_row)?,
    }
    .collect::<rusqlite::Result<Vec<_>>>()?;

    strains.into_iter().map(|s| hydrate(conn, s)).collect()
  }
}

/// Load one strain by surrogate id; used right after a write.
pub(crate) fn hydrate_by_id(
  conn: &Connection,
  strain_id: i64,
) -> rusqlite::Result<RawHydrated> {
  let sql = format!(
    "SELECT {} FROM strain s WHERE s.strain_id = ?1",
    RawStrain::COLUMNS
  );
  let strain = conn.query_row(&sql, params![strain_id], RawStrain::from_row)?;
  hydrate(conn, strain)
}

/// Attach the association lists to a base row. Only the traits' display
/// fields are selected.
fn hydrate(conn: &Connection, strain: RawStrain) -> rusqlite::Result<RawHydrated> {
  let mut stmt = conn.prepare_cached(
    "SELECT f.name
     FROM strain_flavors sf
     JOIN flavor f ON f.flavor_id = sf.flavor_id
     WHERE sf.strain_id = ?1
     ORDER BY f.name",
  )?;
  let flavors = stmt
    .query_map(params![strain.strain_id], |row| Ok(Flavor { name: row.get(0)? }))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare_cached(
    "SELECT e.name, e.category
     FROM strain_effects se
     JOIN effect e ON e.effect_id = se.effect_id
     WHERE se.strain_id = ?1
     ORDER BY e.category, e.name",
  )?;
  let effects = stmt
    .query_map(params![strain.strain_id], |row| effect_from_row(row, 0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(RawHydrated { strain, flavors, effects })
}
