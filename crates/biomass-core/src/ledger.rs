//! Per-critter body mass bookkeeping.
//!
//! A [`MassLedger`] tracks the current body mass of one critter and how it
//! grows from what the critter eats. Every operation is a silent no-op on
//! non-positive input: the ledger runs on the per-tick hot path and must
//! never fail.

use crate::fixed::{Calories, Fixed64, Kg, MASS_FLOOR, div_or_zero, floor_mass};
use serde::{Deserialize, Serialize};

/// Which accumulation formula feeds body mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MassMode {
    /// Gain `calories / calorie_ratio` kg per report.
    #[default]
    CaloriesBased,
    /// Gain `kg * mass_ratio` kg per report.
    ConsumedMassBased,
}

/// Tracked body mass, accumulation mode and conversion ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassLedger {
    current_mass: Kg,
    starting_mass: Kg,
    mode: MassMode,
    /// Calories needed per kg gained (Calories mode). Must be > 0 for any gain.
    calorie_ratio: Fixed64,
    /// Multiplier on reported consumed mass (ConsumedMass mode). Negative acts as 0.
    mass_ratio: Fixed64,
    total_calories_consumed: Calories,
    total_mass_consumed: Kg,
}

impl MassLedger {
    /// Create a ledger at spawn with the species starting mass.
    pub fn new(starting_mass: Kg, mode: MassMode, calorie_ratio: Fixed64, mass_ratio: Fixed64) -> Self {
        let mass = floor_mass(starting_mass);
        Self {
            current_mass: mass,
            starting_mass: mass,
            mode,
            calorie_ratio,
            mass_ratio,
            total_calories_consumed: Fixed64::ZERO,
            total_mass_consumed: Fixed64::ZERO,
        }
    }

    pub fn current_mass(&self) -> Kg {
        self.current_mass
    }

    pub fn starting_mass(&self) -> Kg {
        self.starting_mass
    }

    pub fn mode(&self) -> MassMode {
        self.mode
    }

    pub fn calorie_ratio(&self) -> Fixed64 {
        self.calorie_ratio
    }

    pub fn mass_ratio(&self) -> Fixed64 {
        self.mass_ratio
    }

    pub fn total_calories_consumed(&self) -> Calories {
        self.total_calories_consumed
    }

    pub fn total_mass_consumed(&self) -> Kg {
        self.total_mass_consumed
    }

    /// Mass gained since the baseline snapshot (may be negative after a reset).
    pub fn growth(&self) -> Kg {
        self.current_mass.saturating_sub(self.starting_mass)
    }

    /// Credit eaten calories. Only applies in [`MassMode::CaloriesBased`].
    /// Returns the kg actually gained.
    pub fn report_calories_consumed(&mut self, calories: Calories) -> Kg {
        if self.mode != MassMode::CaloriesBased || calories <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        let gain = if self.calorie_ratio > Fixed64::ZERO {
            div_or_zero(calories, self.calorie_ratio)
        } else {
            Fixed64::ZERO
        };
        self.total_calories_consumed = self.total_calories_consumed.saturating_add(calories);
        self.add_mass(gain)
    }

    /// Credit eaten mass. Only applies in [`MassMode::ConsumedMassBased`].
    /// Returns the kg actually gained.
    pub fn report_consumed_mass(&mut self, kg: Kg) -> Kg {
        if self.mode != MassMode::ConsumedMassBased || kg <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        let gain = kg.saturating_mul(self.mass_ratio.max(Fixed64::ZERO));
        self.total_mass_consumed = self.total_mass_consumed.saturating_add(kg);
        self.add_mass(gain)
    }

    /// Overwrite current and starting mass, zeroing telemetry. Used when
    /// loading saved state or inheriting mass from another critter.
    pub fn set_absolute_mass(&mut self, new_mass: Kg) {
        let mass = floor_mass(new_mass);
        self.current_mass = mass;
        self.starting_mass = mass;
        self.total_calories_consumed = Fixed64::ZERO;
        self.total_mass_consumed = Fixed64::ZERO;
    }

    /// Change the accumulation mode. With `keep_current_as_baseline` the
    /// current mass becomes the new starting mass and telemetry is zeroed.
    pub fn switch_mode(&mut self, new_mode: MassMode, keep_current_as_baseline: bool) {
        if self.mode == new_mode {
            return;
        }
        if keep_current_as_baseline {
            self.rebaseline();
        }
        self.mode = new_mode;
    }

    /// Take `other`'s body mass and configuration.
    ///
    /// Mass always comes across through [`Self::set_absolute_mass`]. Unless
    /// `carry_over_as_starting_mass` is set, the raw telemetry counters are
    /// copied verbatim afterwards.
    pub fn copy_from(&mut self, other: &MassLedger, carry_over_as_starting_mass: bool) {
        self.set_absolute_mass(other.current_mass);
        self.mode = other.mode;
        self.calorie_ratio = other.calorie_ratio;
        self.mass_ratio = other.mass_ratio;
        if !carry_over_as_starting_mass {
            self.total_calories_consumed = other.total_calories_consumed;
            self.total_mass_consumed = other.total_mass_consumed;
        }
    }

    pub fn set_calorie_ratio(&mut self, ratio: Fixed64) {
        self.calorie_ratio = ratio;
    }

    pub fn set_mass_ratio(&mut self, ratio: Fixed64) {
        self.mass_ratio = ratio;
    }

    fn rebaseline(&mut self) {
        self.starting_mass = self.current_mass;
        self.total_calories_consumed = Fixed64::ZERO;
        self.total_mass_consumed = Fixed64::ZERO;
    }

    fn add_mass(&mut self, gain: Kg) -> Kg {
        let before = self.current_mass;
        self.current_mass = floor_mass(self.current_mass.saturating_add(gain));
        self.current_mass - before
    }
}

impl Default for MassLedger {
    fn default() -> Self {
        Self::new(MASS_FLOOR, MassMode::CaloriesBased, Fixed64::ZERO, Fixed64::ZERO)
    }
}
