//! Buffer of computed outputs waiting for the next flush.
//!
//! Entries are created lazily on first credit and removed only by
//! [`PendingOutputAccumulator::drain_all`], which empties the table in one
//! call so outputs are never split across two flushes.

use crate::disease::DiseasePayload;
use crate::fixed::{Fixed64, Kelvin, Kg, div_or_zero};
use crate::id::SubstanceTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One output's buffered mass, temperature sum and disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PendingOutput {
    pub mass: Kg,
    /// Sum of `mass * temperature` over every credit.
    pub weighted_temperature: Fixed64,
    pub disease: DiseasePayload,
}

impl PendingOutput {
    /// Mass-weighted average temperature. `None` while the entry holds no mass.
    pub fn average_temperature(&self) -> Option<Kelvin> {
        if self.mass <= Fixed64::ZERO {
            None
        } else {
            Some(div_or_zero(self.weighted_temperature, self.mass))
        }
    }
}

/// One output handed to the placement collaborator on flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainedOutput {
    pub output: SubstanceTag,
    pub mass: Kg,
    pub temperature: Kelvin,
    pub disease: DiseasePayload,
}

/// Pending outputs keyed by output tag, iterated in tag order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingOutputAccumulator {
    entries: BTreeMap<SubstanceTag, PendingOutput>,
}

impl PendingOutputAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add output mass. No-op for non-positive mass or an invalid tag.
    pub fn credit(
        &mut self,
        output: SubstanceTag,
        mass: Kg,
        temperature: Kelvin,
        disease: DiseasePayload,
    ) {
        if mass <= Fixed64::ZERO || !output.is_valid() {
            return;
        }
        let entry = self.entries.entry(output).or_default();
        entry.mass = entry.mass.saturating_add(mass);
        entry.weighted_temperature = entry
            .weighted_temperature
            .saturating_add(mass.saturating_mul(temperature));
        entry.disease = entry.disease.merge(disease);
    }

    /// Total buffered mass across all outputs. Does not drain.
    pub fn peek_total_mass(&self) -> Kg {
        self.entries
            .values()
            .fold(Fixed64::ZERO, |acc, e| acc.saturating_add(e.mass))
    }

    pub fn get(&self, output: SubstanceTag) -> Option<&PendingOutput> {
        self.entries.get(&output)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty the table, returning every entry that holds mass.
    pub fn drain_all(&mut self) -> Vec<DrainedOutput> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .filter_map(|(output, entry)| {
                entry.average_temperature().map(|temperature| DrainedOutput {
                    output,
                    mass: entry.mass,
                    temperature,
                    disease: entry.disease,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::DiseaseId;

    fn f(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    #[test]
    fn credit_creates_entry_lazily() {
        let mut acc = PendingOutputAccumulator::new();
        assert!(acc.is_empty());
        acc.credit(SubstanceTag(1), f(2.0), f(300.0), DiseasePayload::NONE);
        assert_eq!(acc.len(), 1);
        assert_eq!(acc.get(SubstanceTag(1)).unwrap().mass, f(2.0));
    }

    #[test]
    fn non_positive_credit_is_dropped() {
        let mut acc = PendingOutputAccumulator::new();
        acc.credit(SubstanceTag(1), f(0.0), f(300.0), DiseasePayload::NONE);
        acc.credit(SubstanceTag(1), f(-1.0), f(300.0), DiseasePayload::NONE);
        acc.credit(SubstanceTag::INVALID, f(1.0), f(300.0), DiseasePayload::NONE);
        assert!(acc.is_empty());
    }

    #[test]
    fn temperature_is_mass_weighted() {
        let mut acc = PendingOutputAccumulator::new();
        acc.credit(SubstanceTag(1), f(1.0), f(280.0), DiseasePayload::NONE);
        acc.credit(SubstanceTag(1), f(3.0), f(320.0), DiseasePayload::NONE);
        let entry = acc.get(SubstanceTag(1)).unwrap();
        assert_eq!(entry.average_temperature(), Some(f(310.0)));
    }

    #[test]
    fn same_disease_counts_add() {
        let mut acc = PendingOutputAccumulator::new();
        let germs = DiseasePayload::new(DiseaseId(2), 5);
        acc.credit(SubstanceTag(1), f(1.0), f(300.0), germs);
        acc.credit(SubstanceTag(1), f(1.0), f(300.0), germs);
        let drained = acc.drain_all();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].disease, DiseasePayload::new(DiseaseId(2), 10));
    }

    #[test]
    fn peek_does_not_drain() {
        let mut acc = PendingOutputAccumulator::new();
        acc.credit(SubstanceTag(1), f(1.5), f(300.0), DiseasePayload::NONE);
        acc.credit(SubstanceTag(2), f(2.5), f(300.0), DiseasePayload::NONE);
        assert_eq!(acc.peek_total_mass(), f(4.0));
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn drain_empties_table() {
        let mut acc = PendingOutputAccumulator::new();
        for tag in 1..=3 {
            acc.credit(SubstanceTag(tag), f(1.0), f(300.0), DiseasePayload::NONE);
        }
        let drained = acc.drain_all();
        assert_eq!(drained.len(), 3);
        assert_eq!(acc.peek_total_mass(), f(0.0));
        assert!(acc.drain_all().is_empty());
    }

    #[test]
    fn drain_order_follows_tags() {
        let mut acc = PendingOutputAccumulator::new();
        acc.credit(SubstanceTag(9), f(1.0), f(300.0), DiseasePayload::NONE);
        acc.credit(SubstanceTag(3), f(1.0), f(300.0), DiseasePayload::NONE);
        let tags: Vec<_> = acc.drain_all().iter().map(|d| d.output).collect();
        assert_eq!(tags, vec![SubstanceTag(3), SubstanceTag(9)]);
    }
}
