//! Resolution pipeline: reads data files, resolves cross-references, fills a
//! species registry builder.
//!
//! A content directory holds `substances` and `species` files (required) and
//! an optional `drops` file, each in exactly one of RON, JSON or TOML.

use crate::schema::{
    DropEntryData, DropOutputData, DropTableData, MassModeData, PhaseData, SeekingData, SpeciesData,
    SubstanceData,
};
use biomass_core::diet::{ConversionSpec, Diet, FoodOverride, ResourceInputSpec, SubstancePhase};
use biomass_core::drops::{DropEntry, DropOutput};
use biomass_core::fixed::f64_to_fixed64;
use biomass_core::id::{SpeciesKey, SubstanceTag};
use biomass_core::ledger::MassMode;
use biomass_core::registry::{RegistryError, SpeciesDef, SpeciesRegistry, SpeciesRegistryBuilder};
use biomass_core::scale::VisualScaleMapper;
use biomass_core::seeking::SeekingConfig;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The resolved content failed registry validation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }

    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &'static str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name,
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Deserialize a list from a file. TOML files hold the array under
/// `toml_key` in a top-level table; RON and JSON hold a bare list.
pub fn deserialize_list<T: DeserializeOwned>(path: &Path, toml_key: &str) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .remove(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Return a `DuplicateName` error if `name` is already in the map.
pub fn check_duplicate<V>(map: &HashMap<String, V>, name: &str, file: &Path) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Load every content file in `dir` into a builder.
///
/// The builder is returned unbuilt so callers can still mutate species
/// before freezing the registry.
pub fn load_species_data(dir: &Path) -> Result<SpeciesRegistryBuilder, DataLoadError> {
    let mut builder = SpeciesRegistryBuilder::new();

    let substances_path = require_data_file(dir, "substances")?;
    let substances = load_substances(&substances_path, &mut builder)?;

    let species_path = require_data_file(dir, "species")?;
    let species: Vec<SpeciesData> = deserialize_list(&species_path, "species")?;
    let mut keys: HashMap<String, SpeciesKey> = HashMap::new();
    for data in &species {
        check_duplicate(&keys, &data.name, &species_path)?;
        let def = resolve_species(data, &substances, &species_path)?;
        keys.insert(data.name.clone(), builder.register_species(def));
    }
    debug!(count = species.len(), file = %species_path.display(), "species loaded");

    if let Some(drops_path) = find_data_file(dir, "drops")? {
        load_drops(&drops_path, &substances, &mut builder)?;
    }

    Ok(builder)
}

/// [`load_species_data`] followed by validation.
pub fn load_species_registry(dir: &Path) -> Result<SpeciesRegistry, DataLoadError> {
    Ok(load_species_data(dir)?.build()?)
}

type SubstanceMap = HashMap<String, (SubstanceTag, SubstancePhase)>;

fn load_substances(path: &Path, builder: &mut SpeciesRegistryBuilder) -> Result<SubstanceMap, DataLoadError> {
    let list: Vec<SubstanceData> = deserialize_list(path, "substances")?;
    let mut map = SubstanceMap::new();
    for data in list {
        check_duplicate(&map, &data.name, path)?;
        let phase = match data.phase {
            PhaseData::Solid => SubstancePhase::Solid,
            PhaseData::Liquid => SubstancePhase::Liquid,
            PhaseData::Gas => SubstancePhase::Gas,
        };
        let tag = builder.register_substance(&data.name, phase);
        map.insert(data.name, (tag, phase));
    }
    debug!(count = map.len(), file = %path.display(), "substances loaded");
    Ok(map)
}

fn resolve_species(data: &SpeciesData, substances: &SubstanceMap, file: &Path) -> Result<SpeciesDef, DataLoadError> {
    let tag_of = |name: &str| resolve_name(substances, name, file, "substance").map(|(tag, _)| *tag);

    let mut inputs = Vec::with_capacity(data.inputs.len());
    for input in &data.inputs {
        let (substance, phase) = *resolve_name(substances, &input.substance, file, "substance")?;
        inputs.push(ResourceInputSpec {
            substance,
            capacity: f64_to_fixed64(input.capacity),
            consumption_rate: f64_to_fixed64(input.rate),
            phase,
            intake_radius: input.radius,
        });
    }

    let mut conversions = Vec::with_capacity(data.conversions.len());
    for conversion in &data.conversions {
        conversions.push(ConversionSpec {
            input: tag_of(&conversion.input)?,
            output: tag_of(&conversion.output)?,
            input_per_main_kg: f64_to_fixed64(conversion.input_per_main_kg),
            output_per_input_kg: f64_to_fixed64(conversion.output_per_input_kg),
            output_temperature: f64_to_fixed64(conversion.output_temperature),
        });
    }

    let mut diet = Diet::new(inputs, conversions, data.allow_blending);
    for adjustment in &data.overrides {
        let food = tag_of(&adjustment.food)?;
        diet.overrides.insert(
            food,
            FoodOverride {
                multiplier: adjustment.multiplier.map(f64_to_fixed64),
                absolute: adjustment.absolute.map(f64_to_fixed64),
            },
        );
    }

    let mut def = SpeciesDef::new(&data.name, f64_to_fixed64(data.starting_mass));
    def.mass_mode = match data.mass_mode {
        MassModeData::Calories => MassMode::CaloriesBased,
        MassModeData::ConsumedMass => MassMode::ConsumedMassBased,
    };
    def.calorie_ratio = f64_to_fixed64(data.calorie_ratio);
    def.mass_ratio = f64_to_fixed64(data.mass_ratio);
    def.body_temperature = f64_to_fixed64(data.body_temperature);
    def.diet = diet;
    def.flush_threshold = f64_to_fixed64(data.flush_threshold);
    if let Some(scale) = &data.scale {
        def.scale = VisualScaleMapper::new(
            f64_to_fixed64(scale.at_baseline),
            f64_to_fixed64(scale.at_max_multiple),
            f64_to_fixed64(scale.max_multiple),
        );
    }
    if let Some(seeking) = &data.seeking {
        def.seeking = resolve_seeking(seeking);
    }
    Ok(def)
}

fn resolve_seeking(data: &SeekingData) -> SeekingConfig {
    let defaults = SeekingConfig::default();
    SeekingConfig {
        refill_threshold: data
            .refill_threshold
            .map_or(defaults.refill_threshold, f64_to_fixed64),
        bite_size: data.bite_size.map_or(defaults.bite_size, f64_to_fixed64),
        travel_timeout: data.travel_timeout.unwrap_or(defaults.travel_timeout),
        stuck_timeout: data.stuck_timeout.unwrap_or(defaults.stuck_timeout),
        retry_delay: data.retry_delay.unwrap_or(defaults.retry_delay),
        rescan_interval: data.rescan_interval.unwrap_or(defaults.rescan_interval),
    }
}

fn load_drops(path: &Path, substances: &SubstanceMap, builder: &mut SpeciesRegistryBuilder) -> Result<(), DataLoadError> {
    let tables: Vec<DropTableData> = deserialize_list(path, "drops")?;
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (index, table) in tables.iter().enumerate() {
        let entries = table
            .entries
            .iter()
            .map(|entry| resolve_drop_entry(entry, substances, path))
            .collect::<Result<Vec<_>, _>>()?;

        match &table.species {
            Some(species) => {
                check_duplicate(&seen, species, path)?;
                seen.insert(species.clone(), index);
                if builder.species_key(species).is_none() {
                    return Err(DataLoadError::UnresolvedRef {
                        file: path.to_path_buf(),
                        name: species.clone(),
                        expected_kind: "species",
                    });
                }
                builder.register_drops(species, entries)?;
            }
            None => {
                let [fallback] = <[DropEntry; 1]>::try_from(entries).map_err(|entries| {
                    parse_error(
                        path,
                        format!("default drop takes one entry, found {}", entries.len()),
                    )
                })?;
                builder.set_default_drop(fallback);
            }
        }
    }
    debug!(count = tables.len(), file = %path.display(), "drop tables loaded");
    Ok(())
}

fn resolve_drop_entry(entry: &DropEntryData, substances: &SubstanceMap, file: &Path) -> Result<DropEntry, DataLoadError> {
    let output = match &entry.output {
        DropOutputData::Substance(name) => {
            DropOutput::Substance(resolve_name(substances, name, file, "substance")?.0)
        }
        DropOutputData::Named(name) => DropOutput::Named(name.clone()),
    };
    Ok(DropEntry {
        output,
        fraction: f64_to_fixed64(entry.fraction),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use biomass_core::fixed::Fixed64;
    use std::fs;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "biomass_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const SUBSTANCES_RON: &str = r#"[
        (name: "rock", phase: solid),
        (name: "co2", phase: gas),
        (name: "coal", phase: solid),
        (name: "oil", phase: liquid),
        (name: "algae", phase: solid),
    ]"#;

    const SPECIES_RON: &str = r#"[
        (
            name: "hatch",
            starting_mass: 100.0,
            flush_threshold: 2.0,
            inputs: [(substance: "rock", capacity: 10.0)],
            conversions: [
                (input: "rock", output: "coal", input_per_main_kg: 1.0, output_per_input_kg: 0.5),
            ],
            seeking: Some((bite_size: Some(2.0))),
        ),
        (
            name: "slickster",
            starting_mass: 50.0,
            mass_mode: consumed_mass,
            mass_ratio: 0.25,
            inputs: [(substance: "co2", capacity: 4.0, rate: 0.5, radius: 2)],
            conversions: [
                (input: "co2", output: "oil", input_per_main_kg: 2.0, output_per_input_kg: 0.5),
            ],
            overrides: [(food: "algae", absolute: Some(1.0))],
        ),
    ]"#;

    // -----------------------------------------------------------------------
    // detect_format / find_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("species.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("species.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("species.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        for name in ["species.yaml", "species"] {
            assert!(matches!(
                detect_format(Path::new(name)),
                Err(DataLoadError::UnsupportedFormat { .. })
            ));
        }
    }

    #[test]
    fn find_data_file_found_and_missing() {
        let dir = make_test_dir("find");
        assert_eq!(find_data_file(&dir, "species").unwrap(), None);

        fs::write(dir.join("species.json"), "[]").unwrap();
        assert_eq!(
            find_data_file(&dir, "species").unwrap(),
            Some(dir.join("species.json"))
        );

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("find_conflict");
        fs::write(dir.join("species.ron"), "[]").unwrap();
        fs::write(dir.join("species.toml"), "").unwrap();

        assert!(matches!(
            find_data_file(&dir, "species"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require_missing");
        assert!(matches!(
            require_data_file(&dir, "substances"),
            Err(DataLoadError::MissingRequired { file: "substances", .. })
        ));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // deserialize_list
    // -----------------------------------------------------------------------

    #[test]
    fn deserialize_list_toml_uses_key() {
        let dir = make_test_dir("list_toml");
        let path = dir.join("substances.toml");
        fs::write(
            &path,
            r#"
[[substances]]
name = "rock"
phase = "solid"
"#,
        )
        .unwrap();

        let list: Vec<SubstanceData> = deserialize_list(&path, "substances").unwrap();
        assert_eq!(list.len(), 1);
        assert!(matches!(
            deserialize_list::<SubstanceData>(&path, "species"),
            Err(DataLoadError::Parse { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_parse_error() {
        let dir = make_test_dir("list_parse");
        let path = dir.join("substances.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();

        assert!(matches!(
            deserialize_list::<SubstanceData>(&path, "substances"),
            Err(DataLoadError::Parse { .. })
        ));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    #[test]
    fn loads_ron_content_into_registry() {
        let dir = make_test_dir("pipeline_ron");
        fs::write(dir.join("substances.ron"), SUBSTANCES_RON).unwrap();
        fs::write(dir.join("species.ron"), SPECIES_RON).unwrap();

        let registry = load_species_registry(&dir).unwrap();
        assert_eq!(registry.substance_count(), 5);
        assert_eq!(registry.species_count(), 2);

        let rock = registry.substance_tag("rock").unwrap();
        let hatch = registry
            .get_species(registry.species_key("hatch").unwrap())
            .unwrap();
        assert_eq!(hatch.starting_mass, Fixed64::from_num(100));
        assert_eq!(hatch.flush_threshold, Fixed64::from_num(2));
        assert_eq!(hatch.diet.inputs[0].substance, rock);
        assert!(hatch.diet.inputs[0].is_solid());
        assert_eq!(hatch.seeking.bite_size, Fixed64::from_num(2));
        assert_eq!(hatch.seeking.retry_delay, SeekingConfig::default().retry_delay);

        let slickster = registry
            .get_species(registry.species_key("slickster").unwrap())
            .unwrap();
        assert_eq!(slickster.mass_mode, MassMode::ConsumedMassBased);
        assert_eq!(slickster.mass_ratio, Fixed64::from_num(0.25));
        assert!(slickster.diet.inputs[0].is_gas());
        assert_eq!(slickster.diet.inputs[0].consumption_rate, Fixed64::from_num(0.5));
        let algae = registry.substance_tag("algae").unwrap();
        assert_eq!(
            slickster.diet.overrides.get(&algae),
            Some(&FoodOverride::absolute(Fixed64::ONE))
        );

        cleanup(&dir);
    }

    #[test]
    fn loads_mixed_formats() {
        let dir = make_test_dir("pipeline_mixed");
        fs::write(
            dir.join("substances.toml"),
            r#"
[[substances]]
name = "rock"
phase = "solid"

[[substances]]
name = "coal"
phase = "solid"
"#,
        )
        .unwrap();
        fs::write(
            dir.join("species.json"),
            r#"[{"name": "hatch", "starting_mass": 100.0,
                 "inputs": [{"substance": "rock", "capacity": 10.0}],
                 "conversions": [{"input": "rock", "output": "coal",
                                  "input_per_main_kg": 1.0, "output_per_input_kg": 0.5}]}]"#,
        )
        .unwrap();

        let registry = load_species_registry(&dir).unwrap();
        assert_eq!(registry.species_count(), 1);

        cleanup(&dir);
    }

    #[test]
    fn drops_file_registers_tables_and_default() {
        let dir = make_test_dir("pipeline_drops");
        fs::write(dir.join("substances.ron"), SUBSTANCES_RON).unwrap();
        fs::write(dir.join("species.ron"), SPECIES_RON).unwrap();
        fs::write(
            dir.join("drops.ron"),
            r#"[
                (species: Some("hatch"), entries: [(output: Substance("coal"), fraction: 0.25)]),
                (entries: [(output: Named("meat"), fraction: 0.5)]),
            ]"#,
        )
        .unwrap();

        let registry = load_species_registry(&dir).unwrap();
        let hatch = registry.species_key("hatch").unwrap();
        let slickster = registry.species_key("slickster").unwrap();
        let coal = registry.substance_tag("coal").unwrap();

        let drops = registry.drops();
        assert_eq!(
            drops.entries(hatch),
            Some(&[DropEntry::substance(coal, Fixed64::from_num(0.25))][..])
        );
        let fallback = drops.resolve(slickster, Fixed64::from_num(4), None);
        assert_eq!(fallback[0].output, DropOutput::Named("meat".to_string()));
        assert_eq!(fallback[0].mass, Fixed64::from_num(2));

        cleanup(&dir);
    }

    #[test]
    fn missing_species_file_is_reported() {
        let dir = make_test_dir("pipeline_missing");
        fs::write(dir.join("substances.ron"), SUBSTANCES_RON).unwrap();

        assert!(matches!(
            load_species_data(&dir),
            Err(DataLoadError::MissingRequired { file: "species", .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn unknown_substance_is_unresolved() {
        let dir = make_test_dir("pipeline_unresolved");
        fs::write(dir.join("substances.ron"), SUBSTANCES_RON).unwrap();
        fs::write(
            dir.join("species.ron"),
            r#"[(name: "hatch", starting_mass: 100.0,
                 inputs: [(substance: "granite", capacity: 10.0)])]"#,
        )
        .unwrap();

        match load_species_data(&dir) {
            Err(DataLoadError::UnresolvedRef {
                name, expected_kind, ..
            }) => {
                assert_eq!(name, "granite");
                assert_eq!(expected_kind, "substance");
            }
            other => panic!("expected UnresolvedRef, got {other:?}"),
        }

        cleanup(&dir);
    }

    #[test]
    fn drops_for_unknown_species_are_unresolved() {
        let dir = make_test_dir("pipeline_drop_species");
        fs::write(dir.join("substances.ron"), SUBSTANCES_RON).unwrap();
        fs::write(dir.join("species.ron"), SPECIES_RON).unwrap();
        fs::write(
            dir.join("drops.ron"),
            r#"[(species: Some("dodo"), entries: [])]"#,
        )
        .unwrap();

        assert!(matches!(
            load_species_data(&dir),
            Err(DataLoadError::UnresolvedRef { expected_kind: "species", .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn default_drop_needs_exactly_one_entry() {
        let dir = make_test_dir("pipeline_default_drop");
        fs::write(dir.join("substances.ron"), SUBSTANCES_RON).unwrap();
        fs::write(dir.join("species.ron"), SPECIES_RON).unwrap();
        fs::write(dir.join("drops.ron"), r#"[(entries: [])]"#).unwrap();

        assert!(matches!(
            load_species_data(&dir),
            Err(DataLoadError::Parse { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let dir = make_test_dir("pipeline_duplicate");
        fs::write(
            dir.join("substances.ron"),
            r#"[(name: "rock", phase: solid), (name: "rock", phase: gas)]"#,
        )
        .unwrap();
        fs::write(dir.join("species.ron"), "[]").unwrap();

        match load_species_data(&dir) {
            Err(DataLoadError::DuplicateName { name, .. }) => assert_eq!(name, "rock"),
            other => panic!("expected DuplicateName, got {other:?}"),
        }

        cleanup(&dir);
    }

    #[test]
    fn invalid_values_fail_registry_validation() {
        let dir = make_test_dir("pipeline_invalid");
        fs::write(dir.join("substances.ron"), SUBSTANCES_RON).unwrap();
        fs::write(
            dir.join("species.ron"),
            r#"[(name: "hatch", starting_mass: 100.0,
                 inputs: [(substance: "rock", capacity: 10.0)],
                 conversions: [(input: "co2", output: "coal",
                                input_per_main_kg: 1.0, output_per_input_kg: 1.0)])]"#,
        )
        .unwrap();

        assert!(load_species_data(&dir).is_ok());
        assert!(matches!(
            load_species_registry(&dir),
            Err(DataLoadError::Registry(RegistryError::UndeclaredInput { .. }))
        ));

        cleanup(&dir);
    }
}
