//! Per-critter state. Each critter exclusively owns its ledger, fuel store
//! and pending outputs; nothing is shared between critters.

use crate::accumulator::{DrainedOutput, PendingOutputAccumulator};
use crate::conversion::{ConversionEngine, ConversionResult};
use crate::drops::DropEntry;
use crate::fixed::{Calories, Fixed64, Kg};
use crate::id::{SpeciesKey, SubstanceTag};
use crate::intake::AmbientIntake;
use crate::ledger::MassLedger;
use crate::registry::SpeciesDef;
use crate::seeking::SeekingStateMachine;
use crate::storage::FuelStorage;
use serde::{Deserialize, Serialize};

/// An inbound "main food consumed" report.
///
/// `calories` feeds calorie-based ledgers, `mass` feeds mass-based ledgers
/// and drives the conversion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub food: SubstanceTag,
    pub mass: Kg,
    pub calories: Calories,
}

impl Meal {
    pub fn new(food: SubstanceTag, mass: Kg, calories: Calories) -> Self {
        Self {
            food,
            mass,
            calories,
        }
    }

    pub fn of_mass(food: SubstanceTag, mass: Kg) -> Self {
        Self::new(food, mass, Fixed64::ZERO)
    }

    pub fn of_calories(food: SubstanceTag, calories: Calories) -> Self {
        Self::new(food, Fixed64::ZERO, calories)
    }
}

/// What one meal did to a critter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MealOutcome {
    pub gained: Kg,
    pub conversion: ConversionResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critter {
    pub species: SpeciesKey,
    pub ledger: MassLedger,
    pub storage: FuelStorage,
    pub pending: PendingOutputAccumulator,
    pub seeking: SeekingStateMachine,
    pub intake: AmbientIntake,
    /// Replaces the species drop table for this critter when set.
    pub drop_override: Option<Vec<DropEntry>>,
}

impl Critter {
    /// A fresh critter at the species starting mass with empty storage.
    pub fn spawn(species: SpeciesKey, def: &SpeciesDef) -> Self {
        Self {
            species,
            ledger: MassLedger::new(def.starting_mass, def.mass_mode, def.calorie_ratio, def.mass_ratio),
            storage: FuelStorage::from_inputs(&def.diet.inputs),
            pending: PendingOutputAccumulator::new(),
            seeking: SeekingStateMachine::new(),
            intake: AmbientIntake::new(),
            drop_override: None,
        }
    }

    /// Grow from a meal, then convert stored fuel for the mass eaten. Any
    /// withdrawal wakes paused ambient intake.
    pub fn apply_meal(&mut self, def: &SpeciesDef, meal: &Meal) -> MealOutcome {
        let gained = self
            .ledger
            .report_calories_consumed(meal.calories)
            .saturating_add(self.ledger.report_consumed_mass(meal.mass));

        let conversion = ConversionEngine::new(&def.diet)
            .with_body_temperature(def.body_temperature)
            .apply_conversion(meal.mass, meal.food, &mut self.storage, &mut self.pending);
        if conversion.resume_intake() {
            self.intake.resume();
        }
        MealOutcome { gained, conversion }
    }

    pub fn flush(&mut self) -> Vec<DrainedOutput> {
        self.pending.drain_all()
    }

    /// Whether pending output has reached the species auto-flush threshold.
    pub fn wants_flush(&self, def: &SpeciesDef) -> bool {
        def.flush_threshold > Fixed64::ZERO && self.pending.peek_total_mass() >= def.flush_threshold
    }

    /// Render scale relative to the ledger's starting mass, so a rebaseline
    /// or inherited mass resets the visual growth.
    pub fn visual_scale(&self, def: &SpeciesDef) -> Fixed64 {
        def.scale.scale(self.ledger.current_mass(), self.ledger.starting_mass())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diet::{ConversionSpec, Diet, ResourceInputSpec, SubstancePhase};
    use crate::disease::DiseasePayload;
    use crate::intake::IntakeState;
    use crate::ledger::MassMode;
    use crate::storage::FuelStore;

    fn f(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    const ROCK: SubstanceTag = SubstanceTag(0);
    const OXYGEN: SubstanceTag = SubstanceTag(1);
    const COAL: SubstanceTag = SubstanceTag(2);

    fn hatch() -> SpeciesDef {
        let mut def = SpeciesDef::new("hatch", f(100.0));
        def.mass_mode = MassMode::ConsumedMassBased;
        def.mass_ratio = f(0.5);
        def.flush_threshold = f(5.0);
        def.diet = Diet::new(
            vec![ResourceInputSpec {
                substance: OXYGEN,
                capacity: f(10.0),
                consumption_rate: f(1.0),
                phase: SubstancePhase::Gas,
                intake_radius: 1,
            }],
            vec![ConversionSpec {
                input: OXYGEN,
                output: COAL,
                input_per_main_kg: f(1.0),
                output_per_input_kg: f(1.0),
                output_temperature: Fixed64::ZERO,
            }],
            false,
        );
        def
    }

    #[test]
    fn spawn_uses_species_configuration() {
        let def = hatch();
        let c = Critter::spawn(SpeciesKey(3), &def);
        assert_eq!(c.ledger.current_mass(), f(100.0));
        assert_eq!(c.ledger.mode(), MassMode::ConsumedMassBased);
        assert_eq!(c.storage.capacity(OXYGEN), f(10.0));
        assert!(c.pending.is_empty());
        assert!(c.drop_override.is_none());
    }

    #[test]
    fn meal_grows_and_converts() {
        let def = hatch();
        let mut c = Critter::spawn(SpeciesKey(0), &def);
        let _ = c.storage.deposit(OXYGEN, f(10.0), f(290.0), DiseasePayload::NONE);

        let outcome = c.apply_meal(&def, &Meal::of_mass(ROCK, f(4.0)));
        assert_eq!(outcome.gained, f(2.0));
        assert_eq!(outcome.conversion.total_withdrawn(), f(4.0));
        assert_eq!(c.storage.available_mass(OXYGEN), f(6.0));
        assert_eq!(c.pending.peek_total_mass(), f(4.0));
        assert!(!c.wants_flush(&def));

        c.apply_meal(&def, &Meal::of_mass(ROCK, f(1.0)));
        assert!(c.wants_flush(&def));
        let drained = c.flush();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].mass, f(5.0));
        assert_eq!(drained[0].temperature, f(290.0));
        assert!(c.pending.is_empty());
    }

    #[test]
    fn withdrawal_wakes_paused_intake() {
        let def = hatch();
        let mut c = Critter::spawn(SpeciesKey(0), &def);
        let _ = c.storage.deposit(OXYGEN, f(10.0), f(300.0), DiseasePayload::NONE);

        struct Full;
        impl crate::intake::AmbientSource for Full {
            fn available_near(&self, _: crate::id::CritterId, _: SubstanceTag, _: u32) -> Kg {
                Fixed64::ONE
            }
            fn absorb(
                &mut self,
                _: crate::id::CritterId,
                _: SubstanceTag,
                _: Kg,
                _: u32,
            ) -> crate::storage::Withdrawal {
                crate::storage::Withdrawal::nothing()
            }
        }
        let mut ids = slotmap::SlotMap::<crate::id::CritterId, ()>::with_key();
        let id = ids.insert(());
        c.intake.tick(id, &def.diet, f(1.0), &mut c.storage, &mut Full);
        assert_eq!(c.intake.state(), IntakeState::PausedFull);

        c.apply_meal(&def, &Meal::of_mass(ROCK, f(1.0)));
        assert_eq!(c.intake.state(), IntakeState::Active);
    }

    #[test]
    fn calorie_meal_does_not_convert_without_mass() {
        let mut def = hatch();
        def.mass_mode = MassMode::CaloriesBased;
        def.calorie_ratio = f(100.0);
        let mut c = Critter::spawn(SpeciesKey(0), &def);
        let _ = c.storage.deposit(OXYGEN, f(10.0), f(300.0), DiseasePayload::NONE);

        let outcome = c.apply_meal(&def, &Meal::of_calories(ROCK, f(250.0)));
        assert_eq!(outcome.gained, f(2.5));
        assert!(outcome.conversion.withdrawn.is_empty());
    }

    #[test]
    fn visual_scale_tracks_growth() {
        let def = hatch();
        let mut c = Critter::spawn(SpeciesKey(0), &def);
        assert_eq!(c.visual_scale(&def), def.scale.scale_at_baseline);
        // 600 kg eaten at ratio 0.5: 100 -> 400 kg, four times the baseline.
        c.ledger.report_consumed_mass(f(600.0));
        assert_eq!(c.visual_scale(&def), def.scale.scale_at_max_multiple);
    }

    #[test]
    fn visual_scale_follows_rebaseline() {
        let def = hatch();
        let mut c = Critter::spawn(SpeciesKey(0), &def);
        c.ledger.report_consumed_mass(f(600.0));
        c.ledger.switch_mode(MassMode::CaloriesBased, true);
        assert_eq!(c.ledger.starting_mass(), f(400.0));
        assert_eq!(c.visual_scale(&def), def.scale.scale_at_baseline);

        c.ledger.set_absolute_mass(f(1000.0));
        assert_eq!(c.visual_scale(&def), def.scale.scale_at_baseline);
    }
}
