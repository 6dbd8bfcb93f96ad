//! The `StrainStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `strains-store-sqlite`).
//! Higher layers (`strains-api`, `strains-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  error::StoreError,
  repr::StrainRepr,
  strain::{EffectCategory, Strain},
};

/// Abstraction over a strain catalog backend.
///
/// Schema preparation is backend-specific and must have completed before any
/// of these methods is called.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait StrainStore: Send + Sync {
  type Error: StoreError;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Create or update the strain identified by `repr.id` so that the stored
  /// state matches `repr` exactly, including its flavor and effect links.
  ///
  /// Links absent from `repr` are removed; interned flavors and effects are
  /// never deleted. The whole operation is atomic.
  fn reconcile(
    &self,
    repr: StrainRepr,
  ) -> impl Future<Output = Result<Strain, Self::Error>> + Send + '_;

  /// Insert a strain that must not exist yet.
  ///
  /// Transient failures are retried up to `max_retries` additional times.
  /// An existing reference id fails immediately with `RecordAlreadyExists`.
  fn create(
    &self,
    repr: StrainRepr,
    max_retries: u32,
  ) -> impl Future<Output = Result<Strain, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Fails with `NotFound` when no strain carries `reference_id`.
  fn by_reference_id(
    &self,
    reference_id: u64,
  ) -> impl Future<Output = Result<Strain, Self::Error>> + Send + '_;

  /// Fails with `NotFound` when no strain carries exactly `name`.
  fn by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Strain, Self::Error>> + Send + 'a;

  fn by_race<'a>(
    &'a self,
    race: &'a str,
  ) -> impl Future<Output = Result<Vec<Strain>, Self::Error>> + Send + 'a;

  fn by_flavor<'a>(
    &'a self,
    flavor: &'a str,
  ) -> impl Future<Output = Result<Vec<Strain>, Self::Error>> + Send + 'a;

  /// Strains linked to an effect called `name`, in any category unless
  /// `category` narrows it.
  fn by_effect<'a>(
    &'a self,
    name: &'a str,
    category: Option<EffectCategory>,
  ) -> impl Future<Output = Result<Vec<Strain>, Self::Error>> + Send + 'a;

  /// Every strain in the catalog, ordered by reference id.
  fn list(
    &self,
  ) -> impl Future<Output = Result<Vec<Strain>, Self::Error>> + Send + '_;
}
