//! Turns "X kg of main food eaten" into fuel withdrawals and output credits.
//!
//! For each conversion group (specs sharing one output) the engine:
//! 1. resolves the fuel requirement per kg of main food, applying any
//!    override registered for the food eaten;
//! 2. withdraws up to that requirement from the fuel store, either from the
//!    first spec's input only or, when blending, richest input first;
//! 3. credits `taken * output_per_input_kg` of output to the accumulator.
//!
//! Insufficient fuel is not an error: whatever was withdrawn is converted.

use crate::accumulator::PendingOutputAccumulator;
use crate::diet::{ConversionGroup, ConversionSpec, Diet};
use crate::fixed::{FALLBACK_TEMPERATURE, Fixed64, Kelvin, Kg};
use crate::id::SubstanceTag;
use crate::storage::{FuelStore, Withdrawal};
use tracing::{debug, trace};

/// Outcome of one conversion call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionResult {
    /// Fuel actually withdrawn, in withdrawal order.
    pub withdrawn: Vec<(SubstanceTag, Kg)>,
    /// Output credited to the accumulator, in credit order.
    pub credited: Vec<(SubstanceTag, Kg)>,
}

impl ConversionResult {
    /// Whether any fuel left the store. Intake that paused on a full store
    /// should be nudged when this holds.
    pub fn resume_intake(&self) -> bool {
        !self.withdrawn.is_empty()
    }

    pub fn total_withdrawn(&self) -> Kg {
        self.withdrawn
            .iter()
            .fold(Fixed64::ZERO, |acc, (_, kg)| acc.saturating_add(*kg))
    }

    pub fn total_credited(&self) -> Kg {
        self.credited
            .iter()
            .fold(Fixed64::ZERO, |acc, (_, kg)| acc.saturating_add(*kg))
    }
}

/// Applies a species' diet to consumption events.
#[derive(Debug, Clone, Copy)]
pub struct ConversionEngine<'a> {
    diet: &'a Diet,
    body_temperature: Option<Kelvin>,
}

impl<'a> ConversionEngine<'a> {
    pub fn new(diet: &'a Diet) -> Self {
        Self {
            diet,
            body_temperature: None,
        }
    }

    /// Temperature used for outputs whose source reports none.
    pub fn with_body_temperature(mut self, temperature: Kelvin) -> Self {
        if temperature > Fixed64::ZERO {
            self.body_temperature = Some(temperature);
        }
        self
    }

    /// Convert fuel for `consumed_main` kg of `main_food`.
    pub fn apply_conversion(
        &self,
        consumed_main: Kg,
        main_food: SubstanceTag,
        store: &mut impl FuelStore,
        pending: &mut PendingOutputAccumulator,
    ) -> ConversionResult {
        let mut result = ConversionResult::default();
        if consumed_main <= Fixed64::ZERO {
            return result;
        }

        for group in self.diet.groups() {
            let required = self
                .diet
                .input_per_main_kg(&group, main_food)
                .saturating_mul(consumed_main);
            if required <= Fixed64::ZERO {
                continue;
            }

            if self.diet.allow_blending {
                self.draw_blended(&group, required, store, pending, &mut result);
            } else {
                let spec = group.first();
                let withdrawal = store.withdraw(spec.input, required);
                self.convert(spec, withdrawal, pending, &mut result);
            }
        }

        if result.resume_intake() {
            debug!(
                food = main_food.0,
                consumed = %consumed_main,
                withdrawn = %result.total_withdrawn(),
                credited = %result.total_credited(),
                "conversion applied"
            );
        }
        result
    }

    /// Richest input first until the requirement is met or inputs run dry.
    fn draw_blended(
        &self,
        group: &ConversionGroup<'_>,
        required: Kg,
        store: &mut impl FuelStore,
        pending: &mut PendingOutputAccumulator,
        result: &mut ConversionResult,
    ) {
        let mut candidates: Vec<(&ConversionSpec, Kg)> = group
            .iter()
            .map(|spec| (spec, store.available_mass(spec.input)))
            .filter(|(_, available)| *available > Fixed64::ZERO)
            .collect();
        // Stable: equal availability keeps declaration order.
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        let mut remaining = required;
        for (spec, available) in candidates {
            if remaining <= Fixed64::ZERO {
                break;
            }
            let withdrawal = store.withdraw(spec.input, remaining.min(available));
            remaining = remaining.saturating_sub(withdrawal.taken);
            self.convert(spec, withdrawal, pending, result);
        }

        if remaining > Fixed64::ZERO {
            trace!(output = group.output.0, short = %remaining, "blended group under-supplied");
        }
    }

    fn convert(
        &self,
        spec: &ConversionSpec,
        withdrawal: Withdrawal,
        pending: &mut PendingOutputAccumulator,
        result: &mut ConversionResult,
    ) {
        if withdrawal.is_empty() {
            return;
        }
        result.withdrawn.push((spec.input, withdrawal.taken));

        let output = withdrawal.taken.saturating_mul(spec.output_per_input_kg.max(Fixed64::ZERO));
        if output <= Fixed64::ZERO {
            return;
        }
        let temperature = self.output_temperature(spec, &withdrawal);
        pending.credit(spec.output, output, temperature, withdrawal.disease);
        result.credited.push((spec.output, output));
    }

    fn output_temperature(&self, spec: &ConversionSpec, withdrawal: &Withdrawal) -> Kelvin {
        if spec.output_temperature > Fixed64::ZERO {
            return spec.output_temperature;
        }
        withdrawal
            .temperature
            .filter(|t| *t > Fixed64::ZERO)
            .or(self.body_temperature)
            .unwrap_or(FALLBACK_TEMPERATURE)
    }
}
