//! Fuel storage: the "available mass" and "withdraw" collaborator the
//! conversion engine draws from, plus an in-memory implementation each
//! critter owns.

use crate::diet::ResourceInputSpec;
use crate::disease::DiseasePayload;
use crate::fixed::{Fixed64, Kelvin, Kg, div_or_zero};
use crate::id::SubstanceTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a withdrawal actually yielded. `taken` may be less than requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Withdrawal {
    pub taken: Kg,
    /// Temperature of the withdrawn mass, when anything was taken.
    pub temperature: Option<Kelvin>,
    pub disease: DiseasePayload,
}

impl Withdrawal {
    pub fn nothing() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.taken <= Fixed64::ZERO
    }
}

/// Source of stored fuel for conversions.
///
/// Implementations are never assumed exact: a withdrawal that returns less
/// than requested is the normal partial-fulfillment case.
pub trait FuelStore {
    fn available_mass(&self, substance: SubstanceTag) -> Kg;
    fn withdraw(&mut self, substance: SubstanceTag, requested: Kg) -> Withdrawal;
}

// ---------------------------------------------------------------------------
// FuelStack
// ---------------------------------------------------------------------------

/// Stored mass of one substance with its blended temperature and germs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelStack {
    pub substance: SubstanceTag,
    pub mass: Kg,
    pub temperature: Kelvin,
    pub disease: DiseasePayload,
}

impl FuelStack {
    fn blend_in(&mut self, mass: Kg, temperature: Kelvin, disease: DiseasePayload) {
        let total = self.mass.saturating_add(mass);
        if total > Fixed64::ZERO {
            let weighted = self
                .mass
                .saturating_mul(self.temperature)
                .saturating_add(mass.saturating_mul(temperature));
            self.temperature = div_or_zero(weighted, total);
        }
        self.mass = total;
        self.disease = self.disease.merge(disease);
    }

    fn take(&mut self, requested: Kg) -> Withdrawal {
        let taken = requested.min(self.mass);
        if taken <= Fixed64::ZERO {
            return Withdrawal::nothing();
        }
        let fraction = div_or_zero(taken, self.mass);
        let carried = self.disease.apportion(fraction);
        self.disease = DiseasePayload::new(
            self.disease.id,
            self.disease.count.saturating_sub(carried.count),
        );
        self.mass -= taken;
        Withdrawal {
            taken,
            temperature: Some(self.temperature),
            disease: carried,
        }
    }
}

// ---------------------------------------------------------------------------
// FuelStorage
// ---------------------------------------------------------------------------

/// Per-critter fuel store with a capacity per substance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuelStorage {
    stacks: Vec<FuelStack>,
    capacities: BTreeMap<SubstanceTag, Kg>,
}

impl FuelStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage sized from a diet's input specs.
    pub fn from_inputs(inputs: &[ResourceInputSpec]) -> Self {
        let mut storage = Self::new();
        for spec in inputs {
            storage.set_capacity(spec.substance, spec.capacity);
        }
        storage
    }

    pub fn set_capacity(&mut self, substance: SubstanceTag, capacity: Kg) {
        self.capacities.insert(substance, capacity.max(Fixed64::ZERO));
    }

    /// Capacity for a substance. Substances with no registered capacity hold nothing.
    pub fn capacity(&self, substance: SubstanceTag) -> Kg {
        self.capacities.get(&substance).copied().unwrap_or(Fixed64::ZERO)
    }

    pub fn remaining_capacity(&self, substance: SubstanceTag) -> Kg {
        self.capacity(substance)
            .saturating_sub(self.available_mass(substance))
            .max(Fixed64::ZERO)
    }

    /// Add fuel. Returns the mass that did not fit.
    #[must_use = "overflow indicates mass that did not fit"]
    pub fn deposit(
        &mut self,
        substance: SubstanceTag,
        mass: Kg,
        temperature: Kelvin,
        disease: DiseasePayload,
    ) -> Kg {
        if mass <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        let to_add = mass.min(self.remaining_capacity(substance));
        let overflow = mass - to_add;
        if to_add > Fixed64::ZERO {
            let carried = disease.apportion(div_or_zero(to_add, mass));
            match self.stacks.iter_mut().find(|s| s.substance == substance) {
                Some(stack) => stack.blend_in(to_add, temperature, carried),
                None => self.stacks.push(FuelStack {
                    substance,
                    mass: to_add,
                    temperature,
                    disease: carried,
                }),
            }
        }
        overflow
    }

    /// Stored mass as a fraction of capacity. Zero-capacity substances read as full.
    pub fn fill_fraction(&self, substance: SubstanceTag) -> Fixed64 {
        let capacity = self.capacity(substance);
        if capacity <= Fixed64::ZERO {
            return Fixed64::ONE;
        }
        crate::fixed::clamp01(div_or_zero(self.available_mass(substance), capacity))
    }

    /// Whether the stored fraction has dropped below `threshold`.
    pub fn needs_refill(&self, substance: SubstanceTag, threshold: Fixed64) -> bool {
        self.fill_fraction(substance) < threshold
    }

    pub fn is_full(&self, substance: SubstanceTag) -> bool {
        self.remaining_capacity(substance) <= Fixed64::ZERO
    }

    pub fn stack(&self, substance: SubstanceTag) -> Option<&FuelStack> {
        self.stacks.iter().find(|s| s.substance == substance)
    }

    pub fn stacks(&self) -> &[FuelStack] {
        &self.stacks
    }

    pub fn total_mass(&self) -> Kg {
        self.stacks
            .iter()
            .fold(Fixed64::ZERO, |acc, s| acc.saturating_add(s.mass))
    }
}

impl FuelStore for FuelStorage {
    fn available_mass(&self, substance: SubstanceTag) -> Kg {
        self.stack(substance).map(|s| s.mass).unwrap_or(Fixed64::ZERO)
    }

    fn withdraw(&mut self, substance: SubstanceTag, requested: Kg) -> Withdrawal {
        if requested <= Fixed64::ZERO {
            return Withdrawal::nothing();
        }
        let Some(stack) = self.stacks.iter_mut().find(|s| s.substance == substance) else {
            return Withdrawal::nothing();
        };
        let withdrawal = stack.take(requested);
        if stack.mass <= Fixed64::ZERO {
            self.stacks.retain(|s| s.mass > Fixed64::ZERO);
        }
        withdrawal
    }
}
