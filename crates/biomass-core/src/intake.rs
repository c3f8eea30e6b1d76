//! Passive absorption of gas and liquid fuel from the surroundings.
//!
//! Solid inputs are acquired by [`crate::seeking`]; everything else trickles
//! in here once per infrequent tick, at each input's consumption rate, until
//! storage is full. A full critter pauses until the conversion engine draws
//! fuel down and nudges it back to active.

use crate::diet::Diet;
use crate::fixed::{FALLBACK_TEMPERATURE, Fixed64, Kg};
use crate::id::{CritterId, SubstanceTag};
use crate::storage::{FuelStorage, Withdrawal};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// The host's gas/liquid grid around a critter.
pub trait AmbientSource {
    /// Mass of `substance` within `radius` cells of the critter.
    fn available_near(&self, critter: CritterId, substance: SubstanceTag, radius: u32) -> Kg;
    /// Remove up to `requested` kg of `substance` within `radius` cells.
    fn absorb(&mut self, critter: CritterId, substance: SubstanceTag, requested: Kg, radius: u32)
    -> Withdrawal;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntakeState {
    #[default]
    Active,
    /// Every ambient input is full. Waits for a resume nudge.
    PausedFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmbientIntake {
    state: IntakeState,
}

impl AmbientIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> IntakeState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == IntakeState::PausedFull
    }

    /// Wake a paused intake. Returns whether the state changed.
    pub fn resume(&mut self) -> bool {
        let was_paused = self.is_paused();
        self.state = IntakeState::Active;
        was_paused
    }

    /// Absorb up to `rate * elapsed_seconds` of each ambient input, capped by
    /// remaining capacity and by what the source holds nearby.
    ///
    /// Returns the mass absorbed per substance; substances that yielded
    /// nothing are omitted.
    pub fn tick(
        &mut self,
        critter: CritterId,
        diet: &Diet,
        elapsed_seconds: Fixed64,
        storage: &mut FuelStorage,
        source: &mut impl AmbientSource,
    ) -> Vec<(SubstanceTag, Kg)> {
        let mut absorbed = Vec::new();
        if self.is_paused() || elapsed_seconds <= Fixed64::ZERO {
            return absorbed;
        }

        for spec in diet.ambient_inputs() {
            let tag = spec.substance;
            let wanted = spec
                .consumption_rate
                .max(Fixed64::ZERO)
                .saturating_mul(elapsed_seconds)
                .min(storage.remaining_capacity(tag));
            if wanted <= Fixed64::ZERO {
                continue;
            }
            let nearby = source.available_near(critter, tag, spec.intake_radius);
            if nearby <= Fixed64::ZERO {
                continue;
            }

            let requested = wanted.min(nearby);
            let got = source.absorb(critter, tag, requested, spec.intake_radius);
            if got.is_empty() {
                continue;
            }
            let taken = got.taken.min(requested);
            let temperature = got.temperature.unwrap_or(FALLBACK_TEMPERATURE);
            let overflow = storage.deposit(tag, taken, temperature, got.disease);
            let stored = taken - overflow;
            trace!(?critter, substance = tag.0, kg = %stored, "ambient intake");
            absorbed.push((tag, stored));
        }

        let mut ambient = diet.ambient_inputs().peekable();
        if ambient.peek().is_some() && ambient.all(|spec| storage.is_full(spec.substance)) {
            self.state = IntakeState::PausedFull;
        }
        absorbed
    }
}
