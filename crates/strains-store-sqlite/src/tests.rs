//! Integration tests for `SqliteStore`, mostly against an in-memory database.

use std::{path::PathBuf, time::Duration};

use strains_core::{
  Lookup, StoreError as _,
  repr::{EffectsRepr, StrainRepr},
  store::StrainStore,
  strain::{EffectCategory, Flavor},
};

use crate::{DatabaseConfig, Error, SchemaOutcome, SqliteStore};

async fn store() -> SqliteStore {
  let s = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  s.ensure_schema(1).await.expect("schema");
  s
}

async fn count(s: &SqliteStore, table: &'static str) -> i64 {
  s.conn
    .call(move |conn| {
      Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| {
        r.get(0)
      })?)
    })
    .await
    .unwrap()
}

fn strs(v: &[&str]) -> Vec<String> { v.iter().map(|s| s.to_string()).collect() }

fn repr(id: u64, name: &str, race: &str, flavors: &[&str]) -> StrainRepr {
  StrainRepr {
    name: name.into(),
    id,
    race: race.into(),
    flavors: strs(flavors),
    effects: EffectsRepr::default(),
  }
}

/// A file-backed config under a directory unique to this process and `tag`.
/// The caller removes the returned root when done.
fn temp_config(tag: &str) -> (PathBuf, DatabaseConfig) {
  let root = std::env::temp_dir()
    .join(format!("strains-store-{tag}-{}", std::process::id()));
  let config = DatabaseConfig {
    data_dir: root.clone(),
    name: "catalog".into(),
    ..Default::default()
  };
  (root, config)
}

async fn exec(s: &SqliteStore, sql: &'static str) {
  s.conn
    .call(move |conn| {
      conn.execute_batch(sql)?;
      Ok(())
    })
    .await
    .unwrap()
}

fn assert_core(err: Error, check: impl Fn(&strains_core::Error) -> bool) {
  match &err {
    Error::Core(core) if check(core) => {}
    other => panic!("unexpected error: {other:?}"),
  }
}

// ─── Schema guard ────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_database_advances_from_zero() {
  let s = SqliteStore::open_in_memory().await.unwrap();
  assert_eq!(s.schema_version().await.unwrap(), 0);

  let outcome = s.ensure_schema(3).await.unwrap();
  assert_eq!(outcome, SchemaOutcome::Advanced { from: 0, to: 3 });
  assert_eq!(s.schema_version().await.unwrap(), 3);
}

#[tokio::test]
async fn rerun_at_same_version_is_current() {
  let s = store().await;
  let outcome = s.ensure_schema(1).await.unwrap();
  assert_eq!(outcome, SchemaOutcome::Current(1));
  assert_eq!(count(&s, "database_ver").await, 1);
}

#[tokio::test]
async fn version_zero_is_treated_as_one() {
  let s = SqliteStore::open_in_memory().await.unwrap();
  let outcome = s.ensure_schema(0).await.unwrap();
  assert_eq!(outcome.version(), 1);
  assert_eq!(s.schema_version().await.unwrap(), 1);
}

#[tokio::test]
async fn forward_migration_replaces_the_single_row() {
  let s = store().await;
  let outcome = s.ensure_schema(4).await.unwrap();
  assert_eq!(outcome, SchemaOutcome::Advanced { from: 1, to: 4 });
  assert_eq!(count(&s, "database_ver").await, 1);

  let applied_by: String = s
    .conn
    .call(|conn| {
      Ok(conn.query_row(
        "SELECT applied_by FROM database_ver WHERE id = 1",
        [],
        |r| r.get(0),
      )?)
    })
    .await
    .unwrap();
  assert_eq!(applied_by, "in-memory");
}

#[tokio::test]
async fn downgrade_is_refused_and_nothing_changes() {
  let s = SqliteStore::open_in_memory().await.unwrap();
  s.ensure_schema(5).await.unwrap();

  let err = s.ensure_schema(3).await.unwrap_err();
  assert_core(err, |e| {
    matches!(
      e,
      strains_core::Error::VersionRegression { stored: 5, desired: 3 }
    )
  });
  assert_eq!(s.schema_version().await.unwrap(), 5);
}

// ─── Opening ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn open_creates_the_logical_database() {
  let root = std::env::temp_dir()
    .join(format!("strains-store-test-{}", std::process::id()));
  let config = DatabaseConfig {
    data_dir: root.join("nested"),
    name: "catalog".into(),
    ..Default::default()
  };

  let s = SqliteStore::open(&config).await.unwrap();
  s.ensure_schema(2).await.unwrap();
  s.reconcile(repr(1, "foo", "sativa", &["citrus"])).await.unwrap();
  s.close().await.unwrap();
  assert!(config.path().exists());

  // Reopening sees the same data and version.
  let s = SqliteStore::open(&config).await.unwrap();
  assert_eq!(s.ensure_schema(2).await.unwrap(), SchemaOutcome::Current(2));
  assert_eq!(s.by_reference_id(1).await.unwrap().name, "foo");
  s.close().await.unwrap();

  std::fs::remove_dir_all(&root).unwrap();
}

#[tokio::test]
async fn open_rejects_missing_name() {
  let config = DatabaseConfig { name: "".into(), ..Default::default() };
  let err = SqliteStore::open(&config).await.err().unwrap();
  assert_core(err, |e| matches!(e, strains_core::Error::DatabaseNameNotSet));
}

#[tokio::test]
async fn open_rejects_missing_username() {
  let config = DatabaseConfig { username: "".into(), ..Default::default() };
  let err = SqliteStore::open(&config).await.err().unwrap();
  assert_core(err, |e| {
    matches!(e, strains_core::Error::DatabaseUsernameNotSet)
  });
}

#[tokio::test]
async fn closed_store_reports_connection_nil() {
  let s = store().await;
  let handle = s.clone();
  s.close().await.unwrap();

  let err = handle.by_reference_id(1).await.unwrap_err();
  assert_core(err, |e| matches!(e, strains_core::Error::DatabaseConnectionNil));
}

// ─── Reconcile ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn read_after_write() {
  let s = store().await;
  let mut input = repr(7, "foo", "sativa", &["citrus"]);
  input.effects.positive = strs(&["happy"]);

  let written = s.reconcile(input).await.unwrap();
  let read = s.by_reference_id(7).await.unwrap();

  assert_eq!(written, read);
  assert_eq!(read.name, "foo");
  assert_eq!(read.race, "sativa");
  assert_eq!(read.flavors, vec![Flavor::new("citrus")]);
  assert!(read.has_effect("happy", EffectCategory::Positive));
  assert_eq!(read.effects.len(), 1);
}

#[tokio::test]
async fn reconcile_is_idempotent() {
  let s = store().await;
  let mut input = repr(3, "bar", "indica", &["earthy", "pine"]);
  input.effects.negative = strs(&["dry mouth"]);
  input.effects.medical = strs(&["insomnia"]);

  let first = s.reconcile(input.clone()).await.unwrap();
  let counts = [
    count(&s, "strain").await,
    count(&s, "flavor").await,
    count(&s, "effect").await,
    count(&s, "strain_flavors").await,
    count(&s, "strain_effects").await,
  ];

  let second = s.reconcile(input).await.unwrap();
  assert_eq!(first, second);
  assert_eq!(first.updated_at, second.updated_at);
  assert_eq!(
    counts,
    [
      count(&s, "strain").await,
      count(&s, "flavor").await,
      count(&s, "effect").await,
      count(&s, "strain_flavors").await,
      count(&s, "strain_effects").await,
    ]
  );
  assert_eq!(counts, [1, 2, 2, 2, 2]);
}

#[tokio::test]
async fn shrinking_associations_unlinks_without_deleting_traits() {
  let s = store().await;
  let mut a = repr(1, "a", "hybrid", &["A", "B"]);
  a.effects.positive = strs(&["relaxed", "giggly"]);
  s.reconcile(a).await.unwrap();

  let mut other = repr(2, "other", "hybrid", &["B"]);
  other.effects.positive = strs(&["giggly"]);
  s.reconcile(other).await.unwrap();

  let mut shrunk = repr(1, "a", "hybrid", &["A"]);
  shrunk.effects.positive = strs(&["relaxed"]);
  let updated = s.reconcile(shrunk).await.unwrap();

  assert_eq!(updated.flavors, vec![Flavor::new("A")]);
  assert!(!updated.has_effect("giggly", EffectCategory::Positive));

  // B is still interned and still linked to the other strain.
  assert_eq!(count(&s, "flavor").await, 2);
  assert_eq!(count(&s, "effect").await, 2);
  let other = s.by_reference_id(2).await.unwrap();
  assert!(other.has_flavor("B"));
  assert!(other.has_effect("giggly", EffectCategory::Positive));
}

#[tokio::test]
async fn emptied_lists_remove_every_link() {
  let s = store().await;
  let mut input = repr(4, "d", "indica", &["skunk"]);
  input.effects.medical = strs(&["pain"]);
  s.reconcile(input).await.unwrap();

  let cleared = s.reconcile(repr(4, "d", "indica", &[])).await.unwrap();
  assert!(cleared.flavors.is_empty());
  assert!(cleared.effects.is_empty());
  assert_eq!(count(&s, "strain_flavors").await, 0);
  assert_eq!(count(&s, "strain_effects").await, 0);
  assert_eq!(count(&s, "flavor").await, 1);
}

#[tokio::test]
async fn base_fields_are_updated() {
  let s = store().await;
  let before = s.reconcile(repr(5, "old", "indica", &[])).await.unwrap();
  let after = s.reconcile(repr(5, "new", "sativa", &[])).await.unwrap();

  assert_eq!(after.name, "new");
  assert_eq!(after.race, "sativa");
  assert_eq!(after.created_at, before.created_at);
  assert!(after.updated_at >= before.updated_at);
  assert_eq!(count(&s, "strain").await, 1);
}

#[tokio::test]
async fn flavors_are_interned_across_strains() {
  let s = store().await;
  s.reconcile(repr(1, "x", "hybrid", &["citrus"])).await.unwrap();
  s.reconcile(repr(2, "y", "hybrid", &["citrus"])).await.unwrap();

  assert_eq!(count(&s, "flavor").await, 1);
  assert_eq!(count(&s, "strain_flavors").await, 2);
}

#[tokio::test]
async fn same_effect_name_in_two_categories_is_two_effects() {
  let s = store().await;
  let mut input = repr(1, "x", "hybrid", &[]);
  input.effects.positive = strs(&["sleepy"]);
  input.effects.negative = strs(&["sleepy"]);

  let strain = s.reconcile(input).await.unwrap();
  assert_eq!(strain.effects.len(), 2);
  assert_eq!(count(&s, "effect").await, 2);
}

#[tokio::test]
async fn duplicate_names_in_one_repr_link_once() {
  let s = store().await;
  let strain = s
    .reconcile(repr(1, "x", "hybrid", &["citrus", "citrus"]))
    .await
    .unwrap();
  assert_eq!(strain.flavors.len(), 1);
  assert_eq!(count(&s, "strain_flavors").await, 1);
}

#[tokio::test]
async fn reconcile_requires_reference_id() {
  let s = store().await;
  let err = s.reconcile(repr(0, "x", "hybrid", &[])).await.unwrap_err();
  assert_core(err, |e| matches!(e, strains_core::Error::ReferenceIdNotSet));
  assert_eq!(count(&s, "strain").await, 0);
}

#[tokio::test]
async fn failed_reconcile_rolls_back_every_step() {
  let s = store().await;
  s.reconcile(repr(1, "a", "hybrid", &["A", "B"])).await.unwrap();
  exec(
    &s,
    "CREATE TRIGGER reject_effect_links BEFORE INSERT ON strain_effects
     BEGIN SELECT RAISE(ABORT, 'effect links disabled'); END;",
  )
  .await;

  // Fails on the last step, after the rename and the unlink of B.
  let mut input = repr(1, "renamed", "indica", &["A"]);
  input.effects.positive = strs(&["happy"]);
  let err = s.reconcile(input).await.unwrap_err();

  assert!(matches!(err, Error::Reconcile { reference_id: 1, .. }), "{err:?}");
  assert!(err.domain().is_none());

  let stored = s.by_reference_id(1).await.unwrap();
  assert_eq!(stored.name, "a");
  assert_eq!(stored.race, "hybrid");
  assert_eq!(stored.flavors, vec![Flavor::new("A"), Flavor::new("B")]);
  assert!(stored.effects.is_empty());
  assert_eq!(count(&s, "effect").await, 0);
  assert_eq!(count(&s, "strain_flavors").await, 2);
}

#[tokio::test]
async fn separate_connections_intern_a_shared_flavor_once() {
  let (root, config) = temp_config("interning");
  let first = SqliteStore::open(&config).await.unwrap();
  first.ensure_schema(1).await.unwrap();
  let second = SqliteStore::open(&config).await.unwrap();

  let (a, b) = tokio::join!(
    first.reconcile(repr(1, "lemon haze", "sativa", &["citrus"])),
    second.reconcile(repr(2, "orange bud", "hybrid", &["citrus"])),
  );
  a.unwrap();
  b.unwrap();

  assert_eq!(count(&first, "flavor").await, 1);
  assert_eq!(count(&first, "strain_flavors").await, 2);
  assert!(second.by_reference_id(1).await.unwrap().has_flavor("citrus"));
  assert!(first.by_reference_id(2).await.unwrap().has_flavor("citrus"));

  first.close().await.unwrap();
  second.close().await.unwrap();
  std::fs::remove_dir_all(&root).unwrap();
}

#[tokio::test]
async fn reference_id_beyond_storage_range_is_not_found() {
  let s = store().await;
  let err = s.by_reference_id(u64::MAX).await.unwrap_err();
  assert_core(err, |e| {
    matches!(e, strains_core::Error::NotFound(Lookup::ReferenceId(u64::MAX)))
  });
}

#[tokio::test]
async fn oversized_reference_id_is_rejected_up_front() {
  let s = store().await;

  let err = s.create(repr(u64::MAX, "x", "hybrid", &[]), 2).await.unwrap_err();
  assert_core(err, |e| {
    matches!(e, strains_core::Error::ReferenceIdOutOfRange(u64::MAX))
  });

  let too_big = i64::MAX as u64 + 1;
  let err = s.reconcile(repr(too_big, "x", "hybrid", &[])).await.unwrap_err();
  assert_core(err, |e| {
    matches!(e, strains_core::Error::ReferenceIdOutOfRange(id) if *id == too_big)
  });
  assert_eq!(count(&s, "strain").await, 0);

  // The largest storable id still round-trips.
  let largest = i64::MAX as u64;
  s.create(repr(largest, "edge", "hybrid", &[]), 0).await.unwrap();
  assert_eq!(s.by_reference_id(largest).await.unwrap().name, "edge");
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_inserts_new_strain() {
  let s = store().await;
  let created = s.create(repr(9, "new", "hybrid", &["mint"]), 2).await.unwrap();
  assert_eq!(created.reference_id, 9);
  assert!(created.has_flavor("mint"));
}

#[tokio::test]
async fn create_conflict_is_not_retried_and_changes_nothing() {
  let s = store().await;
  s.create(repr(9, "first", "hybrid", &["mint"]), 2).await.unwrap();

  let err = s
    .create(repr(9, "second", "indica", &["pepper"]), 2)
    .await
    .unwrap_err();
  assert_core(err, |e| {
    matches!(e, strains_core::Error::RecordAlreadyExists(9))
  });

  let stored = s.by_reference_id(9).await.unwrap();
  assert_eq!(stored.name, "first");
  // The losing write's interning was rolled back with it.
  assert_eq!(count(&s, "flavor").await, 1);
}

#[tokio::test]
async fn joined_creates_have_one_winner() {
  let s = store().await;
  let (a, b) = tokio::join!(
    s.create(repr(11, "a", "hybrid", &[]), 1),
    s.create(repr(11, "b", "hybrid", &[]), 1),
  );

  assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
  let loser = a.err().or(b.err()).unwrap();
  assert_core(loser, |e| {
    matches!(e, strains_core::Error::RecordAlreadyExists(11))
  });
}

fn is_busy(e: &Error) -> bool {
  matches!(
    e,
    Error::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(failure, _),
    )) if failure.code == rusqlite::ErrorCode::DatabaseBusy
  )
}

#[tokio::test]
async fn create_on_a_busy_database_exhausts_its_retries() {
  let (root, mut config) = temp_config("busy");
  config.busy_timeout_ms = 10;
  let writer = SqliteStore::open(&config).await.unwrap();
  writer.ensure_schema(1).await.unwrap();
  let blocker = SqliteStore::open(&config).await.unwrap();
  exec(&blocker, "BEGIN IMMEDIATE").await;

  let err = writer
    .create(repr(5, "blocked", "hybrid", &["mint"]), 2)
    .await
    .unwrap_err();
  match &err {
    Error::RetriesExhausted { attempts: 3, source } => {
      assert!(is_busy(source), "{source:?}")
    }
    other => panic!("unexpected error: {other:?}"),
  }

  exec(&blocker, "ROLLBACK").await;
  assert!(writer.by_reference_id(5).await.is_err());
  assert_eq!(count(&writer, "flavor").await, 0);

  writer.close().await.unwrap();
  blocker.close().await.unwrap();
  std::fs::remove_dir_all(&root).unwrap();
}

#[tokio::test]
async fn create_succeeds_once_the_write_lock_is_released() {
  let (root, mut config) = temp_config("released");
  config.busy_timeout_ms = 10;
  let writer = SqliteStore::open(&config).await.unwrap();
  writer.ensure_schema(1).await.unwrap();
  let blocker = SqliteStore::open(&config).await.unwrap();
  exec(&blocker, "BEGIN IMMEDIATE").await;

  let release = async {
    tokio::time::sleep(Duration::from_millis(30)).await;
    exec(&blocker, "ROLLBACK").await;
  };
  let (created, ()) = tokio::join!(
    writer.create(repr(6, "patient", "hybrid", &["mint"]), 10),
    release,
  );

  assert_eq!(created.unwrap().reference_id, 6);
  assert!(writer.by_reference_id(6).await.unwrap().has_flavor("mint"));

  writer.close().await.unwrap();
  blocker.close().await.unwrap();
  std::fs::remove_dir_all(&root).unwrap();
}

// ─── Queries ─────────────────────────────────────────────────────────────────

async fn seeded() -> SqliteStore {
  let s = store().await;

  let mut one = repr(1, "foo", "sativa", &["citrus", "pine"]);
  one.effects.positive = strs(&["happy"]);
  one.effects.medical = strs(&["stress"]);
  s.reconcile(one).await.unwrap();

  let mut two = repr(2, "bar", "indica", &["earthy"]);
  two.effects.negative = strs(&["happy"]);
  s.reconcile(two).await.unwrap();

  let mut three = repr(3, "baz", "sativa", &["citrus"]);
  three.effects.positive = strs(&["happy"]);
  s.reconcile(three).await.unwrap();

  s
}

fn ids(strains: &[strains_core::strain::Strain]) -> Vec<u64> {
  strains.iter().map(|s| s.reference_id).collect()
}

#[tokio::test]
async fn missing_reference_id_is_not_found() {
  let s = seeded().await;
  let err = s.by_reference_id(999_999_999).await.unwrap_err();
  assert_core(err, |e| {
    matches!(
      e,
      strains_core::Error::NotFound(Lookup::ReferenceId(999_999_999))
    )
  });
}

#[tokio::test]
async fn by_name_finds_exact_match() {
  let s = seeded().await;
  assert_eq!(s.by_name("bar").await.unwrap().reference_id, 2);

  let err = s.by_name("Bar").await.unwrap_err();
  assert_core(err, |e| {
    matches!(e, strains_core::Error::NotFound(Lookup::Name(n)) if n == "Bar")
  });
}

#[tokio::test]
async fn by_race_lists_matches_in_reference_order() {
  let s = seeded().await;
  assert_eq!(ids(&s.by_race("sativa").await.unwrap()), vec![1, 3]);
  assert!(s.by_race("ruderalis").await.unwrap().is_empty());
}

#[tokio::test]
async fn by_flavor_hydrates_all_associations() {
  let s = seeded().await;
  let citrus = s.by_flavor("citrus").await.unwrap();
  assert_eq!(ids(&citrus), vec![1, 3]);

  // Hydration returns every flavor, not just the one matched on.
  assert!(citrus[0].has_flavor("pine"));
  assert!(citrus[0].has_effect("stress", EffectCategory::Medical));
}

#[tokio::test]
async fn by_effect_optionally_narrows_by_category() {
  let s = seeded().await;
  assert_eq!(ids(&s.by_effect("happy", None).await.unwrap()), vec![1, 2, 3]);
  assert_eq!(
    ids(
      &s.by_effect("happy", Some(EffectCategory::Positive))
        .await
        .unwrap()
    ),
    vec![1, 3]
  );
  assert_eq!(
    ids(
      &s.by_effect("happy", Some(EffectCategory::Negative))
        .await
        .unwrap()
    ),
    vec![2]
  );
  assert!(s.by_effect("sad", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_returns_everything() {
  let s = seeded().await;
  assert_eq!(ids(&s.list().await.unwrap()), vec![1, 2, 3]);
}
