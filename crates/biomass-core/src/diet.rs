//! Declarative diet configuration: which fuels a species stores and how
//! eating its main food turns stored fuel into byproducts.

use crate::fixed::{Fixed64, Kelvin, Kg};
use crate::id::SubstanceTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Fuel inputs
// ---------------------------------------------------------------------------

/// Physical phase of a fuel substance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubstancePhase {
    /// Acquired by seeking out and biting a target.
    Solid,
    Liquid,
    Gas,
}

/// A fuel substance a species may store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInputSpec {
    pub substance: SubstanceTag,
    /// Maximum stored mass.
    pub capacity: Kg,
    /// Ambient intake rate in kg per second (liquids and gases only).
    pub consumption_rate: Kg,
    pub phase: SubstancePhase,
    /// Cell radius searched by ambient intake.
    pub intake_radius: u32,
}

impl ResourceInputSpec {
    pub fn is_gas(&self) -> bool {
        self.phase == SubstancePhase::Gas
    }

    pub fn is_liquid(&self) -> bool {
        self.phase == SubstancePhase::Liquid
    }

    pub fn is_solid(&self) -> bool {
        self.phase == SubstancePhase::Solid
    }

    /// Whether ambient intake handles this input.
    pub fn is_ambient(&self) -> bool {
        !self.is_solid()
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Turns stored fuel into an output whenever main food is eaten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSpec {
    pub input: SubstanceTag,
    pub output: SubstanceTag,
    /// Fuel required per kg of main food eaten.
    pub input_per_main_kg: Fixed64,
    /// Output produced per kg of fuel withdrawn. Zero makes a pure sink.
    pub output_per_input_kg: Fixed64,
    /// Output temperature. Zero inherits the source temperature.
    pub output_temperature: Kelvin,
}

/// Adjustment of the fuel requirement when a particular main food is eaten.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FoodOverride {
    /// Scales the group's base requirement.
    pub multiplier: Option<Fixed64>,
    /// Replaces the group's base requirement. Wins over `multiplier`.
    pub absolute: Option<Fixed64>,
}

impl FoodOverride {
    pub fn multiplier(v: Fixed64) -> Self {
        Self {
            multiplier: Some(v),
            absolute: None,
        }
    }

    pub fn absolute(v: Fixed64) -> Self {
        Self {
            multiplier: None,
            absolute: Some(v),
        }
    }

    fn apply(&self, base: Fixed64) -> Fixed64 {
        match (self.absolute, self.multiplier) {
            (Some(abs), _) => abs,
            (None, Some(mul)) => base.saturating_mul(mul),
            (None, None) => base,
        }
    }
}

/// Conversion specs sharing one output, in declaration order.
#[derive(Debug, Clone)]
pub struct ConversionGroup<'a> {
    pub output: SubstanceTag,
    specs: &'a [ConversionSpec],
    indices: Vec<usize>,
}

impl<'a> ConversionGroup<'a> {
    /// Specs in the group, first-declared first.
    pub fn iter(&self) -> impl Iterator<Item = &'a ConversionSpec> + '_ {
        self.indices.iter().map(move |&i| &self.specs[i])
    }

    /// The first declared spec. Carries the group's base ratio.
    pub fn first(&self) -> &'a ConversionSpec {
        &self.specs[self.indices[0]]
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Diet
// ---------------------------------------------------------------------------

/// A species' full fuel configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diet {
    pub inputs: Vec<ResourceInputSpec>,
    pub conversions: Vec<ConversionSpec>,
    /// Let one group draw its requirement from several inputs.
    pub allow_blending: bool,
    /// Per-main-food requirement adjustments.
    #[serde(default)]
    pub overrides: BTreeMap<SubstanceTag, FoodOverride>,
}

impl Diet {
    pub fn new(
        inputs: Vec<ResourceInputSpec>,
        conversions: Vec<ConversionSpec>,
        allow_blending: bool,
    ) -> Self {
        Self {
            inputs,
            conversions,
            allow_blending,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, food: SubstanceTag, adjustment: FoodOverride) -> Self {
        self.overrides.insert(food, adjustment);
        self
    }

    /// Conversion groups in order of each output's first appearance.
    pub fn groups(&self) -> Vec<ConversionGroup<'_>> {
        let mut groups: Vec<ConversionGroup<'_>> = Vec::new();
        for (i, spec) in self.conversions.iter().enumerate() {
            match groups.iter_mut().find(|g| g.output == spec.output) {
                Some(group) => group.indices.push(i),
                None => groups.push(ConversionGroup {
                    output: spec.output,
                    specs: &self.conversions,
                    indices: vec![i],
                }),
            }
        }
        groups
    }

    /// Fuel required per kg of `main_food` for a group, after overrides.
    pub fn input_per_main_kg(&self, group: &ConversionGroup<'_>, main_food: SubstanceTag) -> Fixed64 {
        let base = group.first().input_per_main_kg;
        let effective = match self.overrides.get(&main_food) {
            Some(adjustment) => adjustment.apply(base),
            None => base,
        };
        effective.max(Fixed64::ZERO)
    }

    pub fn input_spec(&self, substance: SubstanceTag) -> Option<&ResourceInputSpec> {
        self.inputs.iter().find(|s| s.substance == substance)
    }

    /// Inputs filled by ambient intake rather than by seeking.
    pub fn ambient_inputs(&self) -> impl Iterator<Item = &ResourceInputSpec> {
        self.inputs.iter().filter(|s| s.is_ambient())
    }

    /// Inputs acquired by seeking a target and biting it.
    pub fn solid_inputs(&self) -> impl Iterator<Item = &ResourceInputSpec> {
        self.inputs.iter().filter(|s| s.is_solid())
    }

    pub fn has_conversions(&self) -> bool {
        !self.conversions.is_empty()
    }
}
