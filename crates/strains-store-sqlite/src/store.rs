//! [`SqliteStore`]: the SQLite implementation of [`StrainStore`].

use chrono::Utc;
use rusqlite::TransactionBehavior;
use strains_core::{
  Lookup, StoreError as _,
  repr::StrainRepr,
  store::StrainStore,
  strain::{EffectCategory, Strain},
};

use crate::{
  Error, Result,
  config::DatabaseConfig,
  encode::encode_dt,
  query::{self, StrainQuery},
  reconcile::{self, WriteMode},
  retry::with_retries,
  schema::PRAGMAS,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A strain catalog backed by a single SQLite file.
///
/// Opening a store does not apply the schema; call
/// [`ensure_schema`](Self::ensure_schema) once at startup before any reads or
/// writes.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn:     tokio_rusqlite::Connection,
  /// Recorded as `applied_by` when the schema version advances.
  pub(crate) operator: String,
}

impl SqliteStore {
  /// Open the logical database described by `config`, creating it if it does
  /// not exist yet.
  pub async fn open(config: &DatabaseConfig) -> Result<Self> {
    config.validate()?;
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let conn = tokio_rusqlite::Connection::open(config.path()).await?;
    tracing::debug!(path = %config.path().display(), "opened database");
    Self::init(conn, config.username.clone(), config).await
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, "in-memory".to_owned(), &DatabaseConfig::default()).await
  }

  async fn init(
    conn: tokio_rusqlite::Connection,
    operator: String,
    config: &DatabaseConfig,
  ) -> Result<Self> {
    let busy_timeout = config.busy_timeout();
    conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, operator })
  }

  /// Close the underlying connection. Every clone of this store fails with
  /// `DatabaseConnectionNil` afterwards.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  /// Run the reconciliation write path inside one immediate transaction and
  /// return the hydrated result. `None` inside means a create-only write found
  /// the reference id taken.
  async fn write(&self, repr: StrainRepr, mode: WriteMode) -> Result<Strain> {
    let reference_id = repr.id;
    let now = encode_dt(Utc::now());

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(summary) = reconcile::write_strain(&tx, &repr, mode, &now)?
        else {
          return Ok(None);
        };
        let hydrated = query::hydrate_by_id(&tx, summary.strain_id)?;
        tx.commit()?;
        Ok(Some((summary, hydrated)))
      })
      .await?;

    let Some((summary, hydrated)) = written else {
      return Err(strains_core::Error::RecordAlreadyExists(reference_id).into());
    };

    tracing::debug!(
      reference_id,
      created = summary.created,
      changed = summary.changed,
      stale_flavors = summary.stale_flavors,
      stale_effects = summary.stale_effects,
      "strain written"
    );
    hydrated.into_strain()
  }

  async fn fetch(&self, query: StrainQuery) -> Result<Vec<Strain>> {
    let raws = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let rows = query.load(&tx)?;
        tx.commit()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|raw| raw.into_strain()).collect()
  }

  async fn fetch_one(&self, query: StrainQuery, lookup: Lookup) -> Result<Strain> {
    self
      .fetch(query)
      .await?
      .into_iter()
      .next()
      .ok_or_else(|| strains_core::Error::NotFound(lookup).into())
  }
}

/// SQLite integers are signed 64-bit; larger reference ids cannot be bound.
const MAX_REFERENCE_ID: u64 = i64::MAX as u64;

fn require_reference_id(repr: &StrainRepr) -> Result<()> {
  match repr.id {
    0 => Err(strains_core::Error::ReferenceIdNotSet.into()),
    id if id > MAX_REFERENCE_ID => {
      Err(strains_core::Error::ReferenceIdOutOfRange(id).into())
    }
    _ => Ok(()),
  }
}

// ─── StrainStore impl ────────────────────────────────────────────────────────

impl StrainStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn reconcile(&self, repr: StrainRepr) -> Result<Strain> {
    require_reference_id(&repr)?;
    let reference_id = repr.id;

    self
      .write(repr, WriteMode::Upsert)
      .await
      .map_err(|e| match e.domain() {
        // Domain failures already say what went wrong.
        Some(_) => e,
        None => Error::Reconcile { reference_id, source: Box::new(e) },
      })
  }

  async fn create(&self, repr: StrainRepr, max_retries: u32) -> Result<Strain> {
    require_reference_id(&repr)?;

    with_retries(max_retries, |_attempt| {
      self.write(repr.clone(), WriteMode::CreateOnly)
    })
    .await
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn by_reference_id(&self, reference_id: u64) -> Result<Strain> {
    if reference_id > MAX_REFERENCE_ID {
      return Err(
        strains_core::Error::NotFound(Lookup::ReferenceId(reference_id)).into(),
      );
    }
    self
      .fetch_one(
        StrainQuery::ReferenceId(reference_id),
        Lookup::ReferenceId(reference_id),
      )
      .await
  }

  async fn by_name(&self, name: &str) -> Result<Strain> {
    self
      .fetch_one(StrainQuery::Name(name.to_owned()), Lookup::Name(name.to_owned()))
      .await
  }

  async fn by_race(&self, race: &str) -> Result<Vec<Strain>> {
    self.fetch(StrainQuery::Race(race.to_owned())).await
  }

  async fn by_flavor(&self, flavor: &str) -> Result<Vec<Strain>> {
    self.fetch(StrainQuery::Flavor(flavor.to_owned())).await
  }

  async fn by_effect(
    &self,
    name: &str,
    category: Option<EffectCategory>,
  ) -> Result<Vec<Strain>> {
    self
      .fetch(StrainQuery::Effect(name.to_owned(), category))
      .await
  }

  async fn list(&self) -> Result<Vec<Strain>> {
    self.fetch(StrainQuery::All).await
  }
}
