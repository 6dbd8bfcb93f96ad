//! The reconciliation write path.
//!
//! Everything here runs on a caller-supplied transaction, so one incoming
//! representation is applied entirely or not at all:
//!
//! 1. intern every flavor and effect it names (find-or-create on the unique
//!    key, so concurrent interning of the same value converges on one row);
//! 2. find or create the strain row by reference id;
//! 3. delete the junction rows whose trait is absent from the incoming set,
//!    leaving the interned rows alone;
//! 4. write the base fields and insert the missing junction rows.
//!
//! Links that survive are never dropped and re-inserted, so readers on other
//! connections never observe a strain with its associations missing.

use rusqlite::{Transaction, params};
use strains_core::{
  repr::StrainRepr,
  strain::{Effect, Flavor, stale},
};

use crate::encode::effect_from_row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
  /// Create the strain if missing, otherwise update it in place.
  Upsert,
  /// Refuse to touch a strain that already exists.
  CreateOnly,
}

/// What a single write did, for logging.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WriteSummary {
  pub strain_id:     i64,
  pub created:       bool,
  pub changed:       bool,
  pub stale_flavors: usize,
  pub stale_effects: usize,
}

// ─── Interning ───────────────────────────────────────────────────────────────

fn intern_flavor(
  tx: &Transaction<'_>,
  name: &str,
  now: &str,
) -> rusqlite::Result<i64> {
  tx.prepare_cached(
    "INSERT INTO flavor (name, created_at) VALUES (?1, ?2)
     ON CONFLICT (name) DO NOTHING",
  )?
  .execute(params![name, now])?;

  tx.prepare_cached("SELECT flavor_id FROM flavor WHERE name = ?1")?
    .query_row(params![name], |r| r.get(0))
}

fn intern_effect(
  tx: &Transaction<'_>,
  effect: &Effect,
  now: &str,
) -> rusqlite::Result<i64> {
  let category = effect.category.as_str();

  tx.prepare_cached(
    "INSERT INTO effect (name, category, created_at) VALUES (?1, ?2, ?3)
     ON CONFLICT (name, category) DO NOTHING",
  )?
  .execute(params![effect.name, category, now])?;

  tx.prepare_cached("SELECT effect_id FROM effect WHERE name = ?1 AND category = ?2")?
    .query_row(params![effect.name, category], |r| r.get(0))
}

// ─── Strain row ──────────────────────────────────────────────────────────────

/// Returns the strain's surrogate id and whether this call created it.
fn find_or_create_strain(
  tx: &Transaction<'_>,
  repr: &StrainRepr,
  now: &str,
) -> rusqlite::Result<(i64, bool)> {
  let inserted = tx.execute(
    "INSERT INTO strain (reference_id, name, race, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?4)
     ON CONFLICT (reference_id) DO NOTHING",
    params![repr.id, repr.name, repr.race, now],
  )?;

  let strain_id = tx.query_row(
    "SELECT strain_id FROM strain WHERE reference_id = ?1",
    params![repr.id],
    |r| r.get(0),
  )?;
  Ok((strain_id, inserted == 1))
}

// ─── Current associations ────────────────────────────────────────────────────

fn linked_flavors(
  tx: &Transaction<'_>,
  strain_id: i64,
) -> rusqlite::Result<Vec<(i64, Flavor)>> {
  let mut stmt = tx.prepare_cached(
    "SELECT f.flavor_id, f.name
     FROM strain_flavors sf
     JOIN flavor f ON f.flavor_id = sf.flavor_id
     WHERE sf.strain_id = ?1",
  )?;
  let rows = stmt
    .query_map(params![strain_id], |row| {
      Ok((row.get(0)?, Flavor { name: row.get(1)? }))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn linked_effects(
  tx: &Transaction<'_>,
  strain_id: i64,
) -> rusqlite::Result<Vec<(i64, Effect)>> {
  let mut stmt = tx.prepare_cached(
    "SELECT e.effect_id, e.name, e.category
     FROM strain_effects se
     JOIN effect e ON e.effect_id = se.effect_id
     WHERE se.strain_id = ?1",
  )?;
  let rows = stmt
    .query_map(params![strain_id], |row| {
      Ok((row.get(0)?, effect_from_row(row, 1)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Write ───────────────────────────────────────────────────────────────────

/// Apply `repr` on `tx`. Returns `None` only in [`WriteMode::CreateOnly`]
/// when the reference id is already taken; the transaction must then be
/// rolled back.
pub(crate) fn write_strain(
  tx: &Transaction<'_>,
  repr: &StrainRepr,
  mode: WriteMode,
  now: &str,
) -> rusqlite::Result<Option<WriteSummary>> {
  let flavors = repr.flavors();
  let flavor_ids = flavors
    .iter()
    .map(|f| intern_flavor(tx, &f.name, now))
    .collect::<rusqlite::Result<Vec<i64>>>()?;

  let effects = repr.effects();
  let effect_ids = effects
    .iter()
    .map(|e| intern_effect(tx, e, now))
    .collect::<rusqlite::Result<Vec<i64>>>()?;

  let (strain_id, created) = find_or_create_strain(tx, repr, now)?;
  if mode == WriteMode::CreateOnly && !created {
    // The caller drops the transaction, discarding any interning above.
    return Ok(None);
  }

  let current_flavors = linked_flavors(tx, strain_id)?;
  let stale_flavors = stale(&current_flavors, &flavors);
  for flavor_id in &stale_flavors {
    tx.prepare_cached(
      "DELETE FROM strain_flavors WHERE strain_id = ?1 AND flavor_id = ?2",
    )?
    .execute(params![strain_id, flavor_id])?;
  }

  let current_effects = linked_effects(tx, strain_id)?;
  let stale_effects = stale(&current_effects, &effects);
  for effect_id in &stale_effects {
    tx.prepare_cached(
      "DELETE FROM strain_effects WHERE strain_id = ?1 AND effect_id = ?2",
    )?
    .execute(params![strain_id, effect_id])?;
  }

  let mut changes = tx.execute(
    "UPDATE strain SET name = ?2, race = ?3
     WHERE strain_id = ?1 AND (name IS NOT ?2 OR race IS NOT ?3)",
    params![strain_id, repr.name, repr.race],
  )?;
  for flavor_id in &flavor_ids {
    changes += tx
      .prepare_cached(
        "INSERT INTO strain_flavors (strain_id, flavor_id) VALUES (?1, ?2)
         ON CONFLICT DO NOTHING",
      )?
      .execute(params![strain_id, flavor_id])?;
  }
  for effect_id in &effect_ids {
    changes += tx
      .prepare_cached(
        "INSERT INTO strain_effects (strain_id, effect_id) VALUES (?1, ?2)
         ON CONFLICT DO NOTHING",
      )?
      .execute(params![strain_id, effect_id])?;
  }

  let changed =
    created || changes > 0 || !stale_flavors.is_empty() || !stale_effects.is_empty();
  if changed && !created {
    tx.execute(
      "UPDATE strain SET updated_at = ?2 WHERE strain_id = ?1",
      params![strain_id, now],
    )?;
  }

  Ok(Some(WriteSummary {
    strain_id,
    created,
    changed,
    stale_flavors: stale_flavors.len(),
    stale_effects: stale_effects.len(),
  }))
}
