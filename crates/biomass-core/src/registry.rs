use crate::diet::{Diet, SubstancePhase};
use crate::drops::{DropEntry, DropOutput, ExtraDropTable};
use crate::fixed::{Fixed64, Kelvin, Kg};
use crate::id::{SpeciesKey, SubstanceTag};
use crate::ledger::MassMode;
use crate::scale::VisualScaleMapper;
use crate::seeking::SeekingConfig;
use std::collections::HashMap;
use tracing::debug;

/// A substance known to the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstanceDef {
    pub name: String,
    pub phase: SubstancePhase,
}

/// Everything a critter of one species is spawned with.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesDef {
    pub name: String,
    pub starting_mass: Kg,
    pub mass_mode: MassMode,
    pub calorie_ratio: Fixed64,
    pub mass_ratio: Fixed64,
    /// Output temperature when neither the spec nor the fuel supplies one.
    pub body_temperature: Kelvin,
    pub diet: Diet,
    pub scale: VisualScaleMapper,
    /// Pending output mass at which the world drains the accumulator on its
    /// own. Zero disables automatic flushing.
    pub flush_threshold: Kg,
    pub seeking: SeekingConfig,
}

impl SpeciesDef {
    /// A species with no diet and default tuning.
    pub fn new(name: &str, starting_mass: Kg) -> Self {
        Self {
            name: name.to_string(),
            starting_mass,
            mass_mode: MassMode::CaloriesBased,
            calorie_ratio: Fixed64::from_num(1000),
            mass_ratio: Fixed64::ONE,
            body_temperature: Fixed64::from_num(310),
            diet: Diet::default(),
            scale: VisualScaleMapper::default(),
            flush_threshold: Fixed64::ZERO,
            seeking: SeekingConfig::default(),
        }
    }
}

/// Builder for an immutable [`SpeciesRegistry`].
/// Three-phase lifecycle: registration -> mutation -> finalization.
#[derive(Debug, Default)]
pub struct SpeciesRegistryBuilder {
    substances: Vec<SubstanceDef>,
    substance_name_to_tag: HashMap<String, SubstanceTag>,
    species: Vec<SpeciesDef>,
    species_name_to_key: HashMap<String, SpeciesKey>,
    drops: ExtraDropTable,
}

impl SpeciesRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase 1: Register a substance. Registering a known name returns its
    /// existing tag.
    pub fn register_substance(&mut self, name: &str, phase: SubstancePhase) -> SubstanceTag {
        if let Some(tag) = self.substance_name_to_tag.get(name) {
            return *tag;
        }
        let tag = SubstanceTag(self.substances.len() as u32);
        self.substances.push(SubstanceDef {
            name: name.to_string(),
            phase,
        });
        self.substance_name_to_tag.insert(name.to_string(), tag);
        tag
    }

    /// Phase 1: Register a species. A known name is replaced in place and
    /// keeps its key, so content patches can re-register at load time.
    pub fn register_species(&mut self, def: SpeciesDef) -> SpeciesKey {
        if let Some(&key) = self.species_name_to_key.get(&def.name) {
            debug!(species = %def.name, "species re-registered");
            self.species[key.0 as usize] = def;
            return key;
        }
        let key = SpeciesKey(self.species.len() as u32);
        self.species_name_to_key.insert(def.name.clone(), key);
        self.species.push(def);
        key
    }

    /// Phase 1: Register a species' extra drops. Last registration wins.
    pub fn register_drops(&mut self, species: &str, entries: Vec<DropEntry>) -> Result<(), RegistryError> {
        let key = self
            .species_key(species)
            .ok_or_else(|| RegistryError::NotFound(species.to_string()))?;
        self.drops.register(key, entries);
        Ok(())
    }

    /// Drop used for species without a table entry. Replaces the built-in
    /// generic byproduct.
    pub fn set_default_drop(&mut self, entry: DropEntry) {
        self.drops.set_fallback(entry);
    }

    /// Phase 2: Mutate an existing species by name.
    pub fn mutate_species<F>(&mut self, name: &str, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut SpeciesDef),
    {
        let key = self
            .species_key(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        f(&mut self.species[key.0 as usize]);
        Ok(())
    }

    pub fn substance_tag(&self, name: &str) -> Option<SubstanceTag> {
        self.substance_name_to_tag.get(name).copied()
    }

    pub fn species_key(&self, name: &str) -> Option<SpeciesKey> {
        self.species_name_to_key.get(name).copied()
    }

    pub fn get_species(&self, key: SpeciesKey) -> Option<&SpeciesDef> {
        self.species.get(key.0 as usize)
    }

    /// Phase 3: Validate and freeze.
    pub fn build(self) -> Result<SpeciesRegistry, RegistryError> {
        for def in &self.species {
            self.validate_species(def)?;
        }
        for key in (0..self.species.len() as u32).map(SpeciesKey) {
            if let Some(entries) = self.drops.entries(key) {
                self.validate_drops(entries)?;
            }
        }
        self.validate_drops(std::slice::from_ref(self.drops.fallback()))?;

        debug!(
            substances = self.substances.len(),
            species = self.species.len(),
            "species registry built"
        );
        Ok(SpeciesRegistry {
            substances: self.substances,
            substance_name_to_tag: self.substance_name_to_tag,
            species: self.species,
            species_name_to_key: self.species_name_to_key,
            drops: self.drops,
        })
    }

    fn check_substance(&self, tag: SubstanceTag) -> Result<(), RegistryError> {
        if (tag.0 as usize) < self.substances.len() {
            Ok(())
        } else {
            Err(RegistryError::InvalidSubstanceRef(tag))
        }
    }

    fn validate_species(&self, def: &SpeciesDef) -> Result<(), RegistryError> {
        let negative = |field: &'static str, value: Fixed64| {
            if value < Fixed64::ZERO {
                Err(RegistryError::NegativeValue {
                    species: def.name.clone(),
                    field,
                })
            } else {
                Ok(())
            }
        };
        negative("starting_mass", def.starting_mass)?;
        negative("calorie_ratio", def.calorie_ratio)?;
        negative("mass_ratio", def.mass_ratio)?;
        negative("body_temperature", def.body_temperature)?;
        negative("flush_threshold", def.flush_threshold)?;
        negative("bite_size", def.seeking.bite_size)?;

        for input in &def.diet.inputs {
            self.check_substance(input.substance)?;
            let declared = self.substances[input.substance.0 as usize].phase;
            if input.phase != declared {
                return Err(RegistryError::PhaseMismatch {
                    species: def.name.clone(),
                    substance: input.substance,
                    declared,
                    input: input.phase,
                });
            }
            negative("capacity", input.capacity)?;
            negative("consumption_rate", input.consumption_rate)?;
        }
        for conversion in &def.diet.conversions {
            self.check_substance(conversion.input)?;
            self.check_substance(conversion.output)?;
            if def.diet.input_spec(conversion.input).is_none() {
                return Err(RegistryError::UndeclaredInput {
                    species: def.name.clone(),
                    substance: conversion.input,
                });
            }
            negative("input_per_main_kg", conversion.input_per_main_kg)?;
            negative("output_per_input_kg", conversion.output_per_input_kg)?;
            negative("output_temperature", conversion.output_temperature)?;
        }
        for food in def.diet.overrides.keys() {
            self.check_substance(*food)?;
        }
        Ok(())
    }

    fn validate_drops(&self, entries: &[DropEntry]) -> Result<(), RegistryError> {
        for entry in entries {
            if let DropOutput::Substance(tag) = entry.output {
                self.check_substance(tag)?;
            }
            if entry.fraction < Fixed64::ZERO || entry.fraction > Fixed64::ONE {
                return Err(RegistryError::DropFractionOutOfRange(entry.fraction));
            }
        }
        Ok(())
    }
}

/// Immutable species and substance table. Frozen after `build()`.
#[derive(Debug)]
pub struct SpeciesRegistry {
    substances: Vec<SubstanceDef>,
    substance_name_to_tag: HashMap<String, SubstanceTag>,
    species: Vec<SpeciesDef>,
    species_name_to_key: HashMap<String, SpeciesKey>,
    drops: ExtraDropTable,
}

impl SpeciesRegistry {
    pub fn get_species(&self, key: SpeciesKey) -> Option<&SpeciesDef> {
        self.species.get(key.0 as usize)
    }

    pub fn get_substance(&self, tag: SubstanceTag) -> Option<&SubstanceDef> {
        self.substances.get(tag.0 as usize)
    }

    pub fn species_key(&self, name: &str) -> Option<SpeciesKey> {
        self.species_name_to_key.get(name).copied()
    }

    pub fn substance_tag(&self, name: &str) -> Option<SubstanceTag> {
        self.substance_name_to_tag.get(name).copied()
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    pub fn substance_count(&self) -> usize {
        self.substances.len()
    }

    pub fn drops(&self) -> &ExtraDropTable {
        &self.drops
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid substance reference: {0:?}")]
    InvalidSubstanceRef(SubstanceTag),
    #[error("species {species}: conversion draws on {substance:?}, which is not a declared input")]
    UndeclaredInput {
        species: String,
        substance: SubstanceTag,
    },
    #[error("species {species}: {field} must not be negative")]
    NegativeValue { species: String, field: &'static str },
    #[error("species {species}: input {substance:?} is {input:?} but the substance is {declared:?}")]
    PhaseMismatch {
        species: String,
        substance: SubstanceTag,
        declared: SubstancePhase,
        input: SubstancePhase,
    },
    #[error("drop fraction {0} outside [0, 1]")]
    DropFractionOutOfRange(Fixed64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diet::{ConversionSpec, ResourceInputSpec};

    fn f(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    fn setup_builder() -> SpeciesRegistryBuilder {
        let mut b = SpeciesRegistryBuilder::new();
        let rock = b.register_substance("rock", SubstancePhase::Solid);
        let oxygen = b.register_substance("oxygen", SubstancePhase::Gas);
        let coal = b.register_substance("coal", SubstancePhase::Solid);

        let mut hatch = SpeciesDef::new("hatch", f(100.0));
        hatch.diet = Diet::new(
            vec![
                ResourceInputSpec {
                    substance: rock,
                    capacity: f(10.0),
                    consumption_rate: f(0.0),
                    phase: SubstancePhase::Solid,
                    intake_radius: 0,
                },
                ResourceInputSpec {
                    substance: oxygen,
                    capacity: f(1.0),
                    consumption_rate: f(0.1),
                    phase: SubstancePhase::Gas,
                    intake_radius: 2,
                },
            ],
            vec![ConversionSpec {
                input: rock,
                output: coal,
                input_per_main_kg: f(1.0),
                output_per_input_kg: f(0.5),
                output_temperature: Fixed64::ZERO,
            }],
            false,
        );
        b.register_species(hatch);
        b
    }

    #[test]
    fn register_and_build() {
        let reg = setup_builder().build().unwrap();
        assert_eq!(reg.substance_count(), 3);
        assert_eq!(reg.species_count(), 1);
        let key = reg.species_key("hatch").unwrap();
        assert_eq!(reg.get_species(key).unwrap().diet.conversions.len(), 1);
        assert_eq!(
            reg.get_substance(reg.substance_tag("oxygen").unwrap()).unwrap().phase,
            SubstancePhase::Gas
        );
    }

    #[test]
    fn substance_registration_is_idempotent() {
        let mut b = SpeciesRegistryBuilder::new();
        let a = b.register_substance("water", SubstancePhase::Liquid);
        let again = b.register_substance("water", SubstancePhase::Liquid);
        assert_eq!(a, again);
    }

    #[test]
    fn re_registering_species_replaces_in_place() {
        let mut b = setup_builder();
        let key = b.species_key("hatch").unwrap();
        let replaced = b.register_species(SpeciesDef::new("hatch", f(7.0)));
        assert_eq!(key, replaced);
        let reg = b.build().unwrap();
        assert_eq!(reg.species_count(), 1);
        assert_eq!(reg.get_species(key).unwrap().starting_mass, f(7.0));
    }

    #[test]
    fn mutate_species() {
        let mut b = setup_builder();
        b.mutate_species("hatch", |def| def.diet.allow_blending = true)
            .unwrap();
        let reg = b.build().unwrap();
        let key = reg.species_key("hatch").unwrap();
        assert!(reg.get_species(key).unwrap().diet.allow_blending);
    }

    #[test]
    fn mutate_nonexistent_fails() {
        let mut b = setup_builder();
        match b.mutate_species("nonexistent", |_| {}) {
            Err(RegistryError::NotFound(name)) => assert_eq!(name, "nonexistent"),
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn drops_for_unknown_species_fail() {
        let mut b = setup_builder();
        assert!(b.register_drops("ghost", vec![]).is_err());
    }

    #[test]
    fn drops_and_default_survive_build() {
        let mut b = setup_builder();
        let coal = b.substance_tag("coal").unwrap();
        b.register_drops("hatch", vec![DropEntry::substance(coal, f(0.25))])
            .unwrap();
        b.set_default_drop(DropEntry::named("meat", f(1.0)));
        let reg = b.build().unwrap();

        let hatch = reg.species_key("hatch").unwrap();
        let drops = reg.drops().resolve(hatch, f(4.0), None);
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].mass, f(1.0));

        let stray = reg.drops().resolve(SpeciesKey(99), f(2.0), None);
        assert_eq!(stray[0].output, DropOutput::Named("meat".to_string()));
    }

    #[test]
    fn invalid_substance_ref_fails() {
        let mut b = setup_builder();
        b.mutate_species("hatch", |def| def.diet.conversions[0].output = SubstanceTag(999))
            .unwrap();
        match b.build() {
            Err(RegistryError::InvalidSubstanceRef(tag)) => {
                assert_eq!(tag, SubstanceTag(999));
                let msg = format!("{}", RegistryError::InvalidSubstanceRef(tag));
                assert!(msg.contains("invalid substance reference"), "got: {msg}");
            }
            other => panic!("expected InvalidSubstanceRef, got: {other:?}"),
        }
    }

    #[test]
    fn conversion_from_undeclared_input_fails() {
        let mut b = setup_builder();
        let coal = b.substance_tag("coal").unwrap();
        b.mutate_species("hatch", |def| def.diet.conversions[0].input = coal)
            .unwrap();
        assert!(matches!(
            b.build(),
            Err(RegistryError::UndeclaredInput { .. })
        ));
    }

    #[test]
    fn negative_values_fail() {
        let mut b = setup_builder();
        b.mutate_species("hatch", |def| def.diet.inputs[0].capacity = f(-1.0))
            .unwrap();
        match b.build() {
            Err(RegistryError::NegativeValue { species, field }) => {
                assert_eq!(species, "hatch");
                assert_eq!(field, "capacity");
            }
            other => panic!("expected NegativeValue, got: {other:?}"),
        }
    }

    #[test]
    fn input_phase_must_match_substance() {
        let mut b = setup_builder();
        b.mutate_species("hatch", |def| def.diet.inputs[1].phase = SubstancePhase::Solid)
            .unwrap();
        match b.build() {
            Err(RegistryError::PhaseMismatch { species, declared, input, .. }) => {
                assert_eq!(species, "hatch");
                assert_eq!(declared, SubstancePhase::Gas);
                assert_eq!(input, SubstancePhase::Solid);
            }
            other => panic!("expected PhaseMismatch, got: {other:?}"),
        }
    }

    #[test]
    fn drop_fraction_out_of_range_fails() {
        let mut b = setup_builder();
        let coal = b.substance_tag("coal").unwrap();
        b.register_drops("hatch", vec![DropEntry::substance(coal, f(1.5))])
            .unwrap();
        assert!(matches!(
            b.build(),
            Err(RegistryError::DropFractionOutOfRange(_))
        ));
    }

    #[test]
    fn default_drop_fraction_is_validated() {
        let mut b = setup_builder();
        b.set_default_drop(DropEntry::named("meat", f(-0.5)));
        assert!(matches!(
            b.build(),
            Err(RegistryError::DropFractionOutOfRange(_))
        ));
    }

    #[test]
    fn empty_registry_builds_successfully() {
        let reg = SpeciesRegistryBuilder::new().build().unwrap();
        assert_eq!(reg.species_count(), 0);
        assert!(reg.get_species(SpeciesKey(0)).is_none());
    }
}
