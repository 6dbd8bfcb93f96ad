//! The external JSON representation of a strain.
//!
//! This is the shape found in seed files and on the HTTP wire. It is never
//! stored as-is: the store translates it into a strain row plus interned
//! flavor and effect rows.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  strain::{Effect, EffectCategory, Flavor, Strain, dedup},
};

/// Effect names partitioned by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectsRepr {
  #[serde(default)]
  pub positive: Vec<String>,
  #[serde(default)]
  pub negative: Vec<String>,
  #[serde(default)]
  pub medical:  Vec<String>,
}

impl EffectsRepr {
  pub fn names(&self, category: EffectCategory) -> &[String] {
    match category {
      EffectCategory::Positive => &self.positive,
      EffectCategory::Negative => &self.negative,
      EffectCategory::Medical => &self.medical,
    }
  }

  fn names_mut(&mut self, category: EffectCategory) -> &mut Vec<String> {
    match category {
      EffectCategory::Positive => &mut self.positive,
      EffectCategory::Negative => &mut self.negative,
      EffectCategory::Medical => &mut self.medical,
    }
  }
}

/// One strain as supplied by a seed file or an HTTP body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrainRepr {
  pub name:    String,
  /// The reference id; the reconciliation key.
  pub id:      u64,
  #[serde(default)]
  pub race:    String,
  #[serde(default)]
  pub flavors: Vec<String>,
  #[serde(default)]
  pub effects: EffectsRepr,
}

impl StrainRepr {
  /// The distinct flavors named by this representation.
  pub fn flavors(&self) -> Vec<Flavor> {
    dedup(self.flavors.iter().map(|name| Flavor::new(name.as_str())))
  }

  /// The distinct effects named by this representation, across all three
  /// categories.
  pub fn effects(&self) -> Vec<Effect> {
    dedup(EffectCategory::ALL.into_iter().flat_map(|category| {
      self
        .effects
        .names(category)
        .iter()
        .map(move |name| Effect::new(name.as_str(), category))
    }))
  }

  pub fn to_json(&self) -> Result<String> { Ok(serde_json::to_string(self)?) }
}

impl From<&Strain> for StrainRepr {
  fn from(strain: &Strain) -> Self {
    let mut effects = EffectsRepr::default();
    for effect in &strain.effects {
      effects.names_mut(effect.category).push(effect.name.clone());
    }
    Self {
      name: strain.name.clone(),
      id: strain.reference_id,
      race: strain.race.clone(),
      flavors: strain.flavors.iter().map(|f| f.name.clone()).collect(),
      effects,
    }
  }
}

/// Parse a seed file: a top-level JSON array of strain representations.
pub fn parse_strains(src: impl Read) -> Result<Vec<StrainRepr>> {
  Ok(serde_json::from_reader(src)?)
}

/// Parse a single strain representation.
pub fn parse_strain(src: impl Read) -> Result<StrainRepr> {
  Ok(serde_json::from_reader(src)?)
}
