//! The strain aggregate and its interned traits.
//!
//! A strain owns two many-to-many collections: flavors and effects. Both are
//! interned, meaning one row per distinct value is shared by every strain that
//! references it. Only the links between a strain and its traits are ever
//! removed; the interned rows themselves persist once created.

use std::{collections::HashSet, fmt, hash::Hash, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Effect category ─────────────────────────────────────────────────────────

/// The partition an effect belongs to in the wire representation.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EffectCategory {
  Positive,
  Negative,
  Medical,
}

impl EffectCategory {
  pub const ALL: [Self; 3] = [Self::Positive, Self::Negative, Self::Medical];

  /// The string stored in the `category` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Positive => "positive",
      Self::Negative => "negative",
      Self::Medical => "medical",
    }
  }
}

impl fmt::Display for EffectCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for EffectCategory {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "positive" => Ok(Self::Positive),
      "negative" => Ok(Self::Negative),
      "medical" => Ok(Self::Medical),
      other => Err(Error::UnknownEffectCategory(other.to_owned())),
    }
  }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// How a strain tastes. Unique by name across the whole catalog.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Flavor {
  pub name: String,
}

impl Flavor {
  pub fn new(name: impl Into<String>) -> Self { Self { name: name.into() } }
}

/// An observed effect of a strain. Unique as a `(name, category)` pair, so
/// the same name may appear once per category.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Effect {
  pub name:     String,
  pub category: EffectCategory,
}

impl Effect {
  pub fn new(name: impl Into<String>, category: EffectCategory) -> Self {
    Self { name: name.into(), category }
  }
}

// ─── Strain ──────────────────────────────────────────────────────────────────

/// A fully hydrated strain: the base row plus both association lists.
///
/// The storage surrogate key is not exposed; `reference_id` is the
/// only identity callers ever see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strain {
  pub reference_id: u64,
  pub name:         String,
  pub race:         String,
  pub flavors:      Vec<Flavor>,
  pub effects:      Vec<Effect>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Strain {
  pub fn has_flavor(&self, name: &str) -> bool {
    self.flavors.iter().any(|f| f.name == name)
  }

  pub fn has_effect(&self, name: &str, category: EffectCategory) -> bool {
    self
      .effects
      .iter()
      .any(|e| e.name == name && e.category == category)
  }
}

// ─── Association diff ────────────────────────────────────────────────────────

/// Return the keys of `current` associations whose value is absent from
/// `incoming`, i.e. the links that must be deleted to bring the stored set in
/// line with the incoming one.
///
/// `current` pairs each linked value with whatever key identifies its junction
/// row (typically the interned row id).
pub fn stale<'a, K, T>(current: &'a [(K, T)], incoming: &[T]) -> Vec<&'a K>
where
  T: Eq + Hash,
{
  let incoming: HashSet<&T> = incoming.iter().collect();
  current
    .iter()
    .filter(|(_, value)| !incoming.contains(value))
    .map(|(key, _)| key)
    .collect()
}

/// Remove duplicates while keeping first-seen order.
pub(crate) fn dedup<T>(values: impl IntoIterator<Item = T>) -> Vec<T>
where
  T: Eq + Hash + Clone,
{
  let mut seen = HashSet::new();
  values
    .into_iter()
    .filter(|v| seen.insert(v.clone()))
    .collect()
}
