//! Bulk seeding from a JSON file.
//!
//! Each record is reconciled on its own. A record that fails is logged and
//! counted, and the run moves on to the next one.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;
use strains_core::{
  repr::{StrainRepr, parse_strains},
  store::StrainStore,
};

/// Outcome of a seed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
  pub applied: usize,
  pub failed:  usize,
}

/// Read a seed file: a top-level JSON array of strain representations.
pub fn load_seed(path: &Path) -> anyhow::Result<Vec<StrainRepr>> {
  let file = File::open(path)
    .with_context(|| format!("failed to open seed file {}", path.display()))?;
  parse_strains(BufReader::new(file))
    .with_context(|| format!("failed to parse seed file {}", path.display()))
}

/// Reconcile every record in order.
pub async fn seed<S: StrainStore>(
  store: &S,
  records: Vec<StrainRepr>,
) -> SeedReport {
  let mut report = SeedReport::default();

  for repr in records {
    let reference_id = repr.id;
    match store.reconcile(repr).await {
      Ok(strain) => {
        report.applied += 1;
        tracing::debug!(reference_id, name = %strain.name, "strain seeded");
      }
      Err(error) => {
        report.failed += 1;
        tracing::warn!(reference_id, %error, "failed to seed strain");
      }
    }
  }

  tracing::info!(applied = report.applied, failed = report.failed, "seed run finished");
  report
}
