//! Serde data file structs for critter content definitions.
//!
//! These structs define the on-disk format for substances, species and
//! extra drops. They are deserialized from RON, JSON, or TOML data files and
//! then resolved into registry types by the loader. Quantities are plain
//! `f64` here and become fixed point only after resolution.

use serde::Deserialize;

// ===========================================================================
// Substances
// ===========================================================================

/// A substance definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct SubstanceData {
    pub name: String,
    pub phase: PhaseData,
}

/// Physical phase of a substance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseData {
    Solid,
    Liquid,
    Gas,
}

// ===========================================================================
// Species
// ===========================================================================

/// A species definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesData {
    pub name: String,
    pub starting_mass: f64,
    #[serde(default)]
    pub mass_mode: MassModeData,
    #[serde(default = "default_calorie_ratio")]
    pub calorie_ratio: f64,
    #[serde(default = "default_one")]
    pub mass_ratio: f64,
    #[serde(default = "default_body_temperature")]
    pub body_temperature: f64,
    #[serde(default)]
    pub inputs: Vec<InputData>,
    #[serde(default)]
    pub conversions: Vec<ConversionData>,
    #[serde(default)]
    pub allow_blending: bool,
    #[serde(default)]
    pub overrides: Vec<OverrideData>,
    #[serde(default)]
    pub scale: Option<ScaleData>,
    #[serde(default)]
    pub flush_threshold: f64,
    #[serde(default)]
    pub seeking: Option<SeekingData>,
}

fn default_calorie_ratio() -> f64 {
    1000.0
}

fn default_one() -> f64 {
    1.0
}

fn default_body_temperature() -> f64 {
    310.0
}

/// Which formula feeds body mass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassModeData {
    #[default]
    Calories,
    ConsumedMass,
}

/// A fuel input the species stores.
#[derive(Debug, Clone, Deserialize)]
pub struct InputData {
    pub substance: String,
    pub capacity: f64,
    /// Ambient intake rate in kg per second. Ignored for solids.
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub radius: u32,
}

/// One input-to-output conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionData {
    pub input: String,
    pub output: String,
    pub input_per_main_kg: f64,
    pub output_per_input_kg: f64,
    /// Zero means "inherit from the fuel or the body".
    #[serde(default)]
    pub output_temperature: f64,
}

/// Requirement adjustment for one main food.
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideData {
    pub food: String,
    #[serde(default)]
    pub multiplier: Option<f64>,
    #[serde(default)]
    pub absolute: Option<f64>,
}

/// Visual growth curve.
#[derive(Debug, Clone, Deserialize)]
pub struct ScaleData {
    pub at_baseline: f64,
    pub at_max_multiple: f64,
    pub max_multiple: f64,
}

/// Seek tuning. Missing fields keep the engine defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeekingData {
    #[serde(default)]
    pub refill_threshold: Option<f64>,
    #[serde(default)]
    pub bite_size: Option<f64>,
    #[serde(default)]
    pub travel_timeout: Option<u64>,
    #[serde(default)]
    pub stuck_timeout: Option<u64>,
    #[serde(default)]
    pub retry_delay: Option<u64>,
    #[serde(default)]
    pub rescan_interval: Option<u64>,
}

// ===========================================================================
// Extra drops
// ===========================================================================

/// A drop table. Without a `species` it sets the default drop, which takes
/// exactly one entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DropTableData {
    #[serde(default)]
    pub species: Option<String>,
    pub entries: Vec<DropEntryData>,
}

/// One fractional secondary yield.
#[derive(Debug, Clone, Deserialize)]
pub struct DropEntryData {
    pub output: DropOutputData,
    pub fraction: f64,
}

/// What a drop produces.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum DropOutputData {
    /// A registered substance, by name.
    Substance(String),
    /// A prefab the host resolves itself.
    Named(String),
}

// ===========================================================================
// TOML wrappers (TOML does not support top-level arrays)
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TomlSubstances {
    pub substances: Vec<SubstanceData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlSpecies {
    pub species: Vec<SpeciesData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlDrops {
    pub drops: Vec<DropTableData>,
}
