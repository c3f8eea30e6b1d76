//! Secondary yields split off a base yield event (death, digestion).
//!
//! Lookup is two-level: a per-critter override replaces the species table
//! entirely; a species with no table entry falls back to the single default
//! entry. Fractions are independent shares of the base yield, not a partition.

use crate::fixed::{Fixed64, Kg};
use crate::id::{SpeciesKey, SubstanceTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// What a drop produces: a registered substance or a named prefab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropOutput {
    Substance(SubstanceTag),
    Named(String),
}

/// One fractional secondary yield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropEntry {
    pub output: DropOutput,
    /// Share of the base yield in `[0, 1]`.
    pub fraction: Fixed64,
}

impl DropEntry {
    pub fn substance(tag: SubstanceTag, fraction: Fixed64) -> Self {
        Self {
            output: DropOutput::Substance(tag),
            fraction,
        }
    }

    pub fn named(name: &str, fraction: Fixed64) -> Self {
        Self {
            output: DropOutput::Named(name.to_string()),
            fraction,
        }
    }
}

/// A resolved secondary yield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDrop {
    pub output: DropOutput,
    pub mass: Kg,
}

/// Prefab name of the built-in fallback drop.
pub const DEFAULT_DROP_NAME: &str = "byproduct";

/// Species-wide drop table with a default fallback entry.
///
/// There is always a fallback. Until content sets one it is
/// [`DEFAULT_DROP_NAME`] at the full base yield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraDropTable {
    species: BTreeMap<SpeciesKey, Vec<DropEntry>>,
    fallback: DropEntry,
}

impl Default for ExtraDropTable {
    fn default() -> Self {
        Self::with_fallback(DropEntry::named(DEFAULT_DROP_NAME, Fixed64::ONE))
    }
}

impl ExtraDropTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table whose unregistered species yield `fallback`.
    pub fn with_fallback(fallback: DropEntry) -> Self {
        Self {
            species: BTreeMap::new(),
            fallback,
        }
    }

    pub fn set_fallback(&mut self, fallback: DropEntry) {
        self.fallback = fallback;
    }

    /// Register entries for a species. Replaces any earlier registration.
    pub fn register(&mut self, species: SpeciesKey, entries: Vec<DropEntry>) {
        if self.species.insert(species, entries).is_some() {
            debug!(species = species.0, "extra drops re-registered");
        }
    }

    pub fn entries(&self, species: SpeciesKey) -> Option<&[DropEntry]> {
        self.species.get(&species).map(Vec::as_slice)
    }

    pub fn fallback(&self) -> &DropEntry {
        &self.fallback
    }

    pub fn is_registered(&self, species: SpeciesKey) -> bool {
        self.species.contains_key(&species)
    }

    /// Split `base_yield` into secondary yields.
    ///
    /// `instance_override`, when present, is used instead of the species
    /// table. Entries with a non-positive fraction or yield are skipped.
    pub fn resolve(
        &self,
        species: SpeciesKey,
        base_yield: Kg,
        instance_override: Option<&[DropEntry]>,
    ) -> Vec<ResolvedDrop> {
        if base_yield <= Fixed64::ZERO {
            return Vec::new();
        }
        let entries: &[DropEntry] = match instance_override {
            Some(entries) => entries,
            None => match self.species.get(&species) {
                Some(entries) => entries,
                None => std::slice::from_ref(&self.fallback),
            },
        };

        entries
            .iter()
            .filter(|e| e.fraction > Fixed64::ZERO)
            .filter_map(|e| {
                let mass = base_yield.saturating_mul(e.fraction.min(Fixed64::ONE));
                (mass > Fixed64::ZERO).then(|| ResolvedDrop {
                    output: e.output.clone(),
                    mass,
                })
            })
            .collect()
    }
}
