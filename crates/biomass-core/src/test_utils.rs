//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::diet::{ConversionSpec, Diet, ResourceInputSpec, SubstancePhase};
use crate::fixed::{Fixed64, Kg};
use crate::id::{CritterId, SubstanceTag};
use crate::intake::AmbientSource;
use crate::ledger::MassMode;
use crate::registry::{SpeciesDef, SpeciesRegistry, SpeciesRegistryBuilder};
use crate::seeking::{ForageContext, SeekingConfig, TargetId, TargetStatus, TravelStatus};
use crate::storage::Withdrawal;
use crate::world::World;
use std::collections::BTreeMap;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Substances (registration order of `standard_builder`)
// ===========================================================================

pub fn rock() -> SubstanceTag {
    SubstanceTag(0)
}
pub fn dirt() -> SubstanceTag {
    SubstanceTag(1)
}
pub fn oxygen() -> SubstanceTag {
    SubstanceTag(2)
}
pub fn co2() -> SubstanceTag {
    SubstanceTag(3)
}
pub fn water() -> SubstanceTag {
    SubstanceTag(4)
}
pub fn coal() -> SubstanceTag {
    SubstanceTag(5)
}
pub fn oil() -> SubstanceTag {
    SubstanceTag(6)
}
pub fn algae() -> SubstanceTag {
    SubstanceTag(7)
}

// ===========================================================================
// Diet constructors
// ===========================================================================

pub fn solid_input(substance: SubstanceTag, capacity: f64) -> ResourceInputSpec {
    ResourceInputSpec {
        substance,
        capacity: fixed(capacity),
        consumption_rate: Fixed64::ZERO,
        phase: SubstancePhase::Solid,
        intake_radius: 0,
    }
}

pub fn gas_input(substance: SubstanceTag, capacity: f64, rate: f64) -> ResourceInputSpec {
    ResourceInputSpec {
        substance,
        capacity: fixed(capacity),
        consumption_rate: fixed(rate),
        phase: SubstancePhase::Gas,
        intake_radius: 2,
    }
}

pub fn conversion(input: SubstanceTag, output: SubstanceTag, per_main: f64, per_input: f64) -> ConversionSpec {
    ConversionSpec {
        input,
        output,
        input_per_main_kg: fixed(per_main),
        output_per_input_kg: fixed(per_input),
        output_temperature: Fixed64::ZERO,
    }
}

// ===========================================================================
// Registry
// ===========================================================================

/// Substances plus three species:
///
/// - `hatch`: seeks rock, turns 1 kg rock per kg eaten into 0.5 kg coal,
///   flushes at 2 kg.
/// - `slickster`: breathes CO2 from the air, 2 kg per kg eaten into 0.5 kg
///   oil, grows by consumed mass.
/// - `shovel`: blends rock and dirt into coal, never flushes on its own.
pub fn standard_builder() -> SpeciesRegistryBuilder {
    let mut b = SpeciesRegistryBuilder::new();
    b.register_substance("rock", SubstancePhase::Solid);
    b.register_substance("dirt", SubstancePhase::Solid);
    b.register_substance("oxygen", SubstancePhase::Gas);
    b.register_substance("co2", SubstancePhase::Gas);
    b.register_substance("water", SubstancePhase::Liquid);
    b.register_substance("coal", SubstancePhase::Solid);
    b.register_substance("oil", SubstancePhase::Liquid);
    b.register_substance("algae", SubstancePhase::Solid);

    let mut hatch = SpeciesDef::new("hatch", fixed(100.0));
    hatch.calorie_ratio = fixed(1000.0);
    hatch.flush_threshold = fixed(2.0);
    hatch.diet = Diet::new(
        vec![solid_input(rock(), 10.0)],
        vec![conversion(rock(), coal(), 1.0, 0.5)],
        false,
    );
    hatch.seeking = SeekingConfig {
        refill_threshold: fixed(0.5),
        bite_size: fixed(2.0),
        travel_timeout: 50,
        stuck_timeout: 10,
        retry_delay: 3,
        rescan_interval: 2,
    };
    b.register_species(hatch);

    let mut slickster = SpeciesDef::new("slickster", fixed(50.0));
    slickster.mass_mode = MassMode::ConsumedMassBased;
    slickster.mass_ratio = fixed(0.25);
    slickster.flush_threshold = fixed(1.0);
    slickster.diet = Diet::new(
        vec![gas_input(co2(), 4.0, 0.5)],
        vec![conversion(co2(), oil(), 2.0, 0.5)],
        false,
    );
    b.register_species(slickster);

    let mut shovel = SpeciesDef::new("shovel", fixed(80.0));
    shovel.diet = Diet::new(
        vec![solid_input(rock(), 10.0), solid_input(dirt(), 10.0)],
        vec![conversion(rock(), coal(), 1.0, 1.0), conversion(dirt(), coal(), 1.0, 1.0)],
        true,
    );
    shovel.seeking.refill_threshold = Fixed64::ZERO;
    b.register_species(shovel);

    b
}

pub fn standard_registry() -> SpeciesRegistry {
    standard_builder().build().expect("standard registry builds")
}

pub fn standard_world() -> World {
    World::new(standard_registry())
}

// ===========================================================================
// Host stand-ins
// ===========================================================================

/// A forage context with no targets at all.
pub struct NoForage;

impl ForageContext for NoForage {
    fn find_target(&mut self, _: CritterId, _: SubstanceTag) -> Option<TargetId> {
        None
    }
    fn target_status(&self, _: CritterId, _: TargetId) -> TargetStatus {
        TargetStatus::Destroyed
    }
    fn travel(&mut self, _: CritterId, _: TargetId) -> TravelStatus {
        TravelStatus::Unreachable
    }
    fn in_range(&self, _: CritterId, _: TargetId) -> bool {
        false
    }
    fn bite(&mut self, _: CritterId, _: TargetId, _: Kg) -> Withdrawal {
        Withdrawal::nothing()
    }
}

/// One pile of solid fuel every critter can reach, `distance` steps away.
/// Travel progress is not tracked per critter: each call moves one step.
pub struct Pile {
    pub remaining: Kg,
    pub distance: u32,
    pub temperature: Fixed64,
    traveled: BTreeMap<CritterId, u32>,
}

impl Pile {
    pub fn new(remaining: f64, distance: u32) -> Self {
        Self {
            remaining: fixed(remaining),
            distance,
            temperature: fixed(295.0),
            traveled: BTreeMap::new(),
        }
    }
}

impl ForageContext for Pile {
    fn find_target(&mut self, critter: CritterId, _: SubstanceTag) -> Option<TargetId> {
        if self.remaining <= Fixed64::ZERO {
            return None;
        }
        self.traveled.insert(critter, 0);
        Some(TargetId(1))
    }
    fn target_status(&self, _: CritterId, _: TargetId) -> TargetStatus {
        TargetStatus::Valid
    }
    fn travel(&mut self, critter: CritterId, _: TargetId) -> TravelStatus {
        let steps = self.traveled.entry(critter).or_insert(0);
        if *steps >= self.distance {
            return TravelStatus::Arrived;
        }
        *steps += 1;
        TravelStatus::EnRoute {
            distance: self.distance - *steps,
        }
    }
    fn in_range(&self, _: CritterId, _: TargetId) -> bool {
        true
    }
    fn bite(&mut self, _: CritterId, _: TargetId, requested: Kg) -> Withdrawal {
        let taken = requested.min(self.remaining).max(Fixed64::ZERO);
        self.remaining -= taken;
        Withdrawal {
            taken,
            temperature: Some(self.temperature),
            disease: Default::default(),
        }
    }
}

/// A uniform gas/liquid grid shared by every critter.
#[derive(Debug, Default)]
pub struct Air {
    pub cells: BTreeMap<SubstanceTag, Kg>,
    pub temperature: Fixed64,
}

impl Air {
    pub fn with(pairs: &[(SubstanceTag, f64)]) -> Self {
        Self {
            cells: pairs.iter().map(|(tag, kg)| (*tag, fixed(*kg))).collect(),
            temperature: fixed(293.0),
        }
    }

    pub fn empty() -> Self {
        Self::with(&[])
    }
}

impl AmbientSource for Air {
    fn available_near(&self, _: CritterId, substance: SubstanceTag, _: u32) -> Kg {
        self.cells.get(&substance).copied().unwrap_or(Fixed64::ZERO)
    }

    fn absorb(&mut self, _: CritterId, substance: SubstanceTag, requested: Kg, _: u32) -> Withdrawal {
        let Some(cell) = self.cells.get_mut(&substance) else {
            return Withdrawal::nothing();
        };
        let taken = requested.min(*cell).max(Fixed64::ZERO);
        *cell -= taken;
        Withdrawal {
            taken,
            temperature: Some(self.temperature),
            disease: Default::default(),
        }
    }
}
